//! Session identity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Display name chosen once per device.
///
/// Not authenticated and not unique. Validated only when created; a name
/// loaded back from local storage is trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a name typed by the user: trimmed, non-empty, at most
    /// `max_len` characters.
    pub fn parse(raw: &str, max_len: usize) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUsername(
                "Please enter your name to continue.".into(),
            ));
        }
        if trimmed.chars().count() > max_len {
            return Err(Error::InvalidUsername(format!(
                "Name must be at most {} characters.",
                max_len
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub(crate) fn from_stored(name: String) -> Option<Self> {
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
