use std::time::SystemTime;

use rand::Rng;

use crate::utils::date::unix_millis;

/// Upper bound (exclusive) of the random part of a storage name.
const NONCE_LIMIT: u32 = 1_000_000_000;

/// Longest sanitized original kept in a storage name, in bytes.
///
/// Leaves room for the prefix under the usual 255-byte file name limit.
const MAX_ORIGINAL_LEN: usize = 100;

/// Extensions longer than this are truncated like the rest of the name.
const MAX_EXTENSION_LEN: usize = 10;

/// Keep ASCII letters, digits, `.` and `-`; drop everything else.
pub fn sanitize(original: &str) -> String {
    original
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-'))
        .collect()
}

/// Collision-resistant storage name for an uploaded file.
///
/// `<unix-millis>-<random>-<sanitized original>`
pub fn storage_name(original: &str) -> String {
    let nonce = rand::thread_rng().gen_range(0..NONCE_LIMIT);
    storage_name_with(original, unix_millis(SystemTime::now()), nonce)
}

fn storage_name_with(original: &str, millis: u64, nonce: u32) -> String {
    format!("{millis}-{nonce}-{}", shorten(&sanitize(original)))
}

/// Cut a sanitized name to `MAX_ORIGINAL_LEN`, keeping a short extension.
///
/// Sanitized names are ASCII, so byte offsets are char boundaries.
fn shorten(name: &str) -> String {
    if name.len() <= MAX_ORIGINAL_LEN {
        return name.to_string();
    }
    let ext = name
        .rfind('.')
        .map(|dot| &name[dot..])
        .filter(|ext| ext.len() <= MAX_EXTENSION_LEN + 1)
        .unwrap_or("");
    format!("{}{ext}", &name[..MAX_ORIGINAL_LEN - ext.len()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_sanitize_strips_unsafe_chars() {
        assert_eq!(sanitize("a.png"), "a.png");
        assert_eq!(sanitize("b#.png"), "b.png");
        assert_eq!(sanitize("my photo (1).JPG"), "myphoto1.JPG");
        assert_eq!(sanitize("été.jpg"), "t.jpg");
    }

    #[test]
    fn test_sanitize_removes_separators() {
        assert_eq!(sanitize("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize("C:\\fakepath\\x.png"), "Cfakepathx.png");
        assert!(!sanitize("/a/b\\c").contains(['/', '\\']));
    }

    #[test]
    fn test_storage_name_format() {
        assert_eq!(
            storage_name_with("b#.png", 1_700_000_000_000, 42),
            "1700000000000-42-b.png"
        );
    }

    #[test]
    fn test_long_name_is_capped_and_keeps_extension() {
        let original = format!("{}.jpeg", "x".repeat(400));
        let name = storage_name_with(&original, 1_700_000_000_000, NONCE_LIMIT - 1);

        assert!(name.len() <= 255, "{} bytes", name.len());
        assert!(name.ends_with("xx.jpeg"));
        assert_eq!(name.len(), "1700000000000-999999999-".len() + MAX_ORIGINAL_LEN);
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("a.png"), "a.png");
        let exact = "y".repeat(MAX_ORIGINAL_LEN);
        assert_eq!(shorten(&exact), exact);

        // No usable extension: plain truncation.
        let dotless = "z".repeat(300);
        assert_eq!(shorten(&dotless), "z".repeat(MAX_ORIGINAL_LEN));
        let long_ext = format!("a.{}", "b".repeat(300));
        assert_eq!(shorten(&long_ext).len(), MAX_ORIGINAL_LEN);
        assert!(shorten(&long_ext).starts_with("a.b"));
    }

    #[test]
    fn test_storage_names_do_not_collide() {
        let names: FxHashSet<_> = (0..64).map(|_| storage_name("a.png")).collect();
        assert_eq!(names.len(), 64);
        assert!(names.iter().all(|n| n.ends_with("-a.png")));
    }
}
