use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of digits a phone-style identifier must have.
pub const PHONE_DIGITS: usize = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ViewerIdError {
    #[error("viewer identifier cannot be empty")]
    Empty,

    #[error("phone number must have exactly 10 digits, got {digits}")]
    InvalidPhone { digits: usize },

    #[error("not a valid email address")]
    InvalidEmail,
}

/// What kind of identifier the viewer entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewerIdKind {
    Phone,
    Email,
}

/// Validated viewer identifier (a 10-digit phone number or an email).
///
/// The identifier ends up in the storage key of the uploaded answers.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewerId {
    value: String,
    kind: ViewerIdKind,
}

impl ViewerId {
    /// Validate a raw identifier typed by the viewer.
    ///
    /// All-digit input is treated as a phone number; anything else must
    /// look like `local@domain.tld`.
    ///
    /// # Errors
    ///
    /// Returns `ViewerIdError::InvalidPhone` or `ViewerIdError::InvalidEmail`
    /// so the caller can show the matching hint.
    pub fn parse(raw: &str) -> Result<Self, ViewerIdError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(ViewerIdError::Empty);
        }

        if value.chars().all(|c| c.is_ascii_digit()) {
            let digits = value.len();
            if digits != PHONE_DIGITS {
                return Err(ViewerIdError::InvalidPhone { digits });
            }
            return Ok(Self {
                value: value.to_string(),
                kind: ViewerIdKind::Phone,
            });
        }

        if !looks_like_email(value) {
            return Err(ViewerIdError::InvalidEmail);
        }

        Ok(Self {
            value: value.to_string(),
            kind: ViewerIdKind::Email,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn kind(&self) -> ViewerIdKind {
        self.kind
    }
}

impl fmt::Debug for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewerId({:?}, {})", self.kind, self.value)
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

// '@' past the first char, last '.' at least two chars after '@',
// and at least two chars after that '.'. No '/' or whitespace, since the
// identifier becomes part of a storage key.
fn looks_like_email(value: &str) -> bool {
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let chars: Vec<char> = value.chars().collect();
    let Some(at) = chars.iter().position(|c| *c == '@') else {
        return false;
    };
    let Some(point) = chars.iter().rposition(|c| *c == '.') else {
        return false;
    };
    at >= 1 && point >= at + 2 && point + 2 < chars.len()
}
