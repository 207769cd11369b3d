use std::path::Path;
use std::time::SystemTime;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Serialize, Serializer};

use crate::utils::date::DateTimeUtc;

/// Recognized photo extensions (matched case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// URL prefix under which photo bytes are served.
pub const PHOTOS_URL_PREFIX: &str = "/photos/";

/// Characters escaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One photo in a snapshot. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhotoEntry {
    name: String,
    url: String,
    #[serde(serialize_with = "serialize_created")]
    created: SystemTime,
}

impl PhotoEntry {
    pub fn new(name: impl Into<String>, created: SystemTime) -> Self {
        let name = name.into();
        let url = photo_url(&name);
        Self { name, url, created }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(test)]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub const fn created(&self) -> SystemTime {
        self.created
    }
}

/// Public URL for a stored photo name.
pub fn photo_url(name: &str) -> String {
    format!(
        "{PHOTOS_URL_PREFIX}{}",
        utf8_percent_encode(name, URI_COMPONENT)
    )
}

/// Whether `name` carries one of the recognized image extensions.
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|k| ext.eq_ignore_ascii_case(k)))
}

fn serialize_created<S: Serializer>(created: &SystemTime, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&DateTimeUtc::from_system_time(*created).to_rfc3339_millis())
}
