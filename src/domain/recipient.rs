use serde::Serialize;
use std::fmt;

/// Strips every non-digit character and prepends `country_code` when the remaining digits do not
/// already start with it.
///
/// Never fails: input without any digits yields an empty string, which callers must reject.
#[must_use]
pub fn normalize(raw: &str, country_code: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() || digits.starts_with(country_code) {
        digits
    } else {
        format!("{country_code}{digits}")
    }
}

/// A normalized, digits-only destination that starts with the configured country code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    /// Normalizes `raw`, returning `None` if nothing addressable is left.
    #[must_use]
    pub fn parse(raw: &str, country_code: &str) -> Option<Self> {
        let normalized = normalize(raw, country_code);
        if normalized.is_empty() { None } else { Some(Self(normalized)) }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier the messaging transport expects, e.g. `5511999990000@c.us`.
    #[must_use]
    pub fn chat_id(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
