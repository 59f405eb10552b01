use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content type of a stored document.
///
/// The set is closed: anything other than JSON or plain text is rejected at
/// ingestion, before a command is ever built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[default]
    #[serde(rename = "application/json")]
    ApplicationJson,
}

impl MediaType {
    /// The MIME name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextPlain => "text/plain",
            Self::ApplicationJson => "application/json",
        }
    }

    /// Parse a `Content-Type` style value.
    ///
    /// Surrounding whitespace and case are ignored, as are parameters such as
    /// `; charset=utf-8`.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let essence = value.split(';').next().unwrap_or_default();
        match essence.trim().to_ascii_lowercase().as_str() {
            "text/plain" => Ok(Self::TextPlain),
            "application/json" => Ok(Self::ApplicationJson),
            _ => Err(TypeError::UnsupportedMediaType(value.trim().to_string())),
        }
    }
}

impl FromStr for MediaType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
