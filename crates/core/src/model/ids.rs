use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier handed out by the identity provider for a signed-in learner.
///
/// Opaque to the engine; only guaranteed to be non-empty.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

/// Identifier of a lesson in the curriculum, e.g. `w1-d1`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LessonId(String);

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} must not be empty", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

fn normalize(kind: &'static str, raw: &str) -> Result<String, ParseIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseIdError { kind });
    }
    Ok(trimmed.to_owned())
}

impl UserId {
    /// Creates a new `UserId`.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the value is empty after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseIdError> {
        normalize("UserId", raw.as_ref()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl LessonId {
    /// Creates a new `LessonId`.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the value is empty after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseIdError> {
        normalize("LessonId", raw.as_ref()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LessonId({})", self.0)
    }
}

// ─── Display / FromStr ─────────────────────────────────────────────────────────

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for LessonId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for LessonId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl From<LessonId> for String {
    fn from(id: LessonId) -> Self {
        id.0
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_id_display() {
        let id = LessonId::new("w1-d1").unwrap();
        assert_eq!(id.to_string(), "w1-d1");
    }

    #[test]
    fn ids_are_trimmed() {
        let id: UserId = "  u1 ".parse().unwrap();
        assert_eq!(id.as_str(), "u1");
    }

    #[test]
    fn empty_ids_are_rejected() {
        assert!("".parse::<UserId>().is_err());
        let err = "   ".parse::<LessonId>().unwrap_err();
        assert_eq!(err.to_string(), "LessonId must not be empty");
    }

    #[test]
    fn serde_rejects_empty_lesson_id() {
        let ok: LessonId = serde_json::from_str("\"w2-d1\"").unwrap();
        assert_eq!(ok.as_str(), "w2-d1");
        assert!(serde_json::from_str::<LessonId>("\"\"").is_err());
    }
}
