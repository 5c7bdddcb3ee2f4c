use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

const PROJECT_PREFIX: &str = "sk-proj-";
const LEGACY_PREFIX: &str = "sk-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Legacy,
    Project,
}

impl KeyKind {
    fn length_range(self) -> RangeInclusive<usize> {
        match self {
            Self::Legacy => 45..=60,
            Self::Project => 150..=200,
        }
    }

    fn visible_prefix(self) -> usize {
        match self {
            Self::Legacy => 8,
            Self::Project => 12,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Project => f.write_str("project-based"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyFormatError {
    #[error("no API key provided")]
    Empty,

    #[error("API key must start with 'sk-' or 'sk-proj-'")]
    BadPrefix,

    #[error("{kind} API key has unusual length {len} (expected {min}-{max})")]
    BadLength {
        kind: KeyKind,
        len: usize,
        min: usize,
        max: usize,
    },

    #[error("API key contains spaces, it was likely corrupted during copy/paste")]
    Corrupted,
}

/// A cleaned key that passed the format check. `Debug` never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    value: String,
    kind: KeyKind,
}

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    pub fn redacted(&self) -> String {
        let shown: String = self.value.chars().take(self.kind.visible_prefix()).collect();
        format!("{}...", shown)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("kind", &self.kind)
            .field("value", &self.redacted())
            .finish()
    }
}

/// Strip whitespace and stray control characters, then check that the key looks
/// like an OpenAI key. This is a format check only; nothing is sent anywhere.
pub fn validate_and_clean_api_key(raw: &str) -> Result<ApiKey, KeyFormatError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect();

    if cleaned.is_empty() {
        return Err(KeyFormatError::Empty);
    }

    let kind = if cleaned.starts_with(PROJECT_PREFIX) {
        KeyKind::Project
    } else if cleaned.starts_with(LEGACY_PREFIX) {
        KeyKind::Legacy
    } else {
        return Err(KeyFormatError::BadPrefix);
    };

    let range = kind.length_range();
    let len = cleaned.chars().count();
    if !range.contains(&len) {
        return Err(KeyFormatError::BadLength {
            kind,
            len,
            min: *range.start(),
            max: *range.end(),
        });
    }

    if cleaned.contains(' ') {
        return Err(KeyFormatError::Corrupted);
    }

    Ok(ApiKey {
        value: cleaned,
        kind,
    })
}
