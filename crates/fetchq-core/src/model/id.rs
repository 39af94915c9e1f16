//! Opaque job identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique job identifier. Rendered as 32 lowercase hex digits; parsing also
/// accepts the hyphenated UUID form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Returned when a string is not a valid job id.
#[derive(Debug, thiserror::Error)]
#[error("invalid job id: {0:?}")]
pub struct ParseJobIdError(String);

impl FromStr for JobId {
    type Err = ParseJobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(JobId)
            .map_err(|_| ParseJobIdError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parse_roundtrip() {
        let id = JobId::new();
        let s = id.to_string();
        assert_eq!(s.len(), 32);
        assert!(!s.contains('-'));
        assert_eq!(s.parse::<JobId>().unwrap(), id);
    }

    #[test]
    fn parse_accepts_hyphenated_form() {
        let id = JobId::new();
        let hyphenated = id.as_uuid().hyphenated().to_string();
        assert_eq!(hyphenated.parse::<JobId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-job".parse::<JobId>().is_err());
        assert!("".parse::<JobId>().is_err());
    }

    #[test]
    fn fresh_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
