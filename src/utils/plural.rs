//! Count formatting for log lines.

/// `"1 photo"`, `"0 photos"`, `"12 photos"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_count() {
        assert_eq!(plural_count(0, "photo"), "0 photos");
        assert_eq!(plural_count(1, "photo"), "1 photo");
        assert_eq!(plural_count(12, "client"), "12 clients");
    }
}
