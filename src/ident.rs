//! SQL identifier validation.
//!
//! Table and column names cannot be bound as parameters, so they are embedded
//! into statement text. [`Ident`] only admits plain unquoted identifiers
//! matching `[A-Za-z_][A-Za-z0-9_]*`; anything else is rejected before it
//! reaches SQL.

use std::fmt;

use crate::error::{Error, Result};

/// A validated table or column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Parse and validate an identifier.
    pub fn parse(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        match chars.next() {
            None => return Err(Error::InvalidIdentifier("identifier cannot be empty".into())),
            Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
            Some(c) => {
                return Err(Error::InvalidIdentifier(format!(
                    "invalid identifier start character '{c}' in {s:?}"
                )));
            }
        }
        if let Some(c) = chars.find(|c| !(*c == '_' || c.is_ascii_alphanumeric())) {
            return Err(Error::InvalidIdentifier(format!(
                "invalid character '{c}' in {s:?}"
            )));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
