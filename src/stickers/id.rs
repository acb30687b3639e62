use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{StageError, StageResult};

/// A `provider:value` sticker reference, e.g. `icons:mdi:home`.
///
/// The provider is everything before the first `:`; the value may itself contain `:`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StickerId {
    provider: String,
    value: String,
}

impl StickerId {
    pub fn new(provider: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            value: value.into(),
        }
    }

    pub fn parse(raw: &str) -> StageResult<Self> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(StageError::sticker("sticker id must be a non-empty string"));
        }
        match s.split_once(':') {
            Some((provider, value)) if !provider.is_empty() && !value.is_empty() => {
                Ok(Self::new(provider.trim(), value.trim()))
            }
            _ => Err(StageError::sticker(format!(
                "invalid sticker id \"{raw}\": expected \"provider:value\""
            ))),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for StickerId {
    type Err = StageError;

    fn from_str(s: &str) -> StageResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stickers/id.rs"]
mod tests;
