//! Core data models: the [`Tag`] label set, the stored [`Snippet`], and
//! validation of user-supplied content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category assigned to every snippet by the tagger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Technical,
    Urgent,
    General,
}

impl Tag {
    /// All labels, in the fixed order used for keyword tie-breaking and
    /// as zero-shot candidate labels.
    pub const ALL: [Tag; 3] = [Tag::Technical, Tag::Urgent, Tag::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Technical => "Technical",
            Tag::Urgent => "Urgent",
            Tag::General => "General",
        }
    }

    /// Comma-separated label names, for error messages.
    pub fn valid_options() -> String {
        Tag::ALL
            .iter()
            .map(Tag::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag(pub String);

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid tag '{}'. Valid options are: {}.",
            self.0,
            Tag::valid_options()
        )
    }
}

impl std::error::Error for UnknownTag {}

impl FromStr for Tag {
    type Err = UnknownTag;

    /// Exact, case-sensitive match against the label names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Technical" => Ok(Tag::Technical),
            "Urgent" => Ok(Tag::Urgent),
            "General" => Ok(Tag::General),
            other => Err(UnknownTag(other.to_string())),
        }
    }
}

/// A stored knowledge snippet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snippet {
    pub id: i64,
    pub content: String,
    #[serde(rename = "ai_tag")]
    pub tag: Tag,
    pub created_at: DateTime<Utc>,
}

impl Snippet {
    /// First `max_chars` characters of the content, with `...` appended
    /// when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.content.chars().count() > max_chars {
            let head: String = self.content.chars().take(max_chars).collect();
            format!("{}...", head)
        } else {
            self.content.clone()
        }
    }
}

/// Reasons a `content` field is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    Missing,
    Null,
    NotAString,
    Blank,
    NullCharacter,
    TooLong { max: usize },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Missing => f.write_str("This field is required."),
            ContentError::Null => f.write_str("This field may not be null."),
            ContentError::NotAString => f.write_str("Not a valid string."),
            ContentError::Blank => f.write_str("Content cannot be empty."),
            ContentError::NullCharacter => f.write_str("Null characters are not allowed."),
            ContentError::TooLong { max } => {
                write!(f, "Content cannot exceed {} characters.", max)
            }
        }
    }
}

impl std::error::Error for ContentError {}

/// Validate a raw `content` value from a request body.
///
/// Returns the trimmed content. Length is measured in characters after
/// trimming.
pub fn validate_content(
    value: Option<&serde_json::Value>,
    max_len: usize,
) -> Result<String, ContentError> {
    let raw = match value {
        None => return Err(ContentError::Missing),
        Some(serde_json::Value::Null) => return Err(ContentError::Null),
        Some(serde_json::Value::String(s)) => s,
        Some(_) => return Err(ContentError::NotAString),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ContentError::Blank);
    }
    if trimmed.contains('\0') {
        return Err(ContentError::NullCharacter);
    }
    if trimmed.chars().count() > max_len {
        return Err(ContentError::TooLong { max: max_len });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tag_parse_is_exact() {
        assert_eq!("Urgent".parse::<Tag>().unwrap(), Tag::Urgent);
        assert!("urgent".parse::<Tag>().is_err());
        assert!("NotARealTag".parse::<Tag>().is_err());
    }

    #[test]
    fn test_unknown_tag_message_lists_options() {
        let err = "Bogus".parse::<Tag>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid tag 'Bogus'. Valid options are: Technical, Urgent, General."
        );
    }

    #[test]
    fn test_snippet_serializes_ai_tag() {
        let snippet = Snippet {
            id: 7,
            content: "hello".to_string(),
            tag: Tag::General,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
        };
        let v = serde_json::to_value(&snippet).unwrap();
        assert_eq!(v["id"], 7);
        assert_eq!(v["ai_tag"], "General");
        assert_eq!(v["created_at"], "1970-01-01T00:00:00Z");
        assert!(v.get("tag").is_none());
    }

    #[test]
    fn test_preview_truncates() {
        let snippet = Snippet {
            id: 1,
            content: "abcdefghij".to_string(),
            tag: Tag::General,
            created_at: Utc::now(),
        };
        assert_eq!(snippet.preview(4), "abcd...");
        assert_eq!(snippet.preview(10), "abcdefghij");
    }

    #[test]
    fn test_validate_trims() {
        let v = json!("  hello world \n");
        assert_eq!(validate_content(Some(&v), 400).unwrap(), "hello world");
    }

    #[test]
    fn test_validate_rejects_blank() {
        let v = json!("   ");
        assert_eq!(validate_content(Some(&v), 400), Err(ContentError::Blank));
        let v = json!("");
        assert_eq!(validate_content(Some(&v), 400), Err(ContentError::Blank));
    }

    #[test]
    fn test_validate_length_boundary() {
        let ok = json!("a".repeat(10));
        assert!(validate_content(Some(&ok), 10).is_ok());
        let long = json!("a".repeat(11));
        assert_eq!(
            validate_content(Some(&long), 10),
            Err(ContentError::TooLong { max: 10 })
        );
    }

    #[test]
    fn test_validate_counts_chars_not_bytes() {
        let v = json!("ééééé");
        assert!(validate_content(Some(&v), 5).is_ok());
    }

    #[test]
    fn test_validate_rejects_nul() {
        let v = json!("a\u{0}b");
        assert_eq!(
            validate_content(Some(&v), 400),
            Err(ContentError::NullCharacter)
        );
        assert_eq!(
            ContentError::NullCharacter.to_string(),
            "Null characters are not allowed."
        );
    }

    #[test]
    fn test_validate_wrong_types() {
        assert_eq!(validate_content(None, 10), Err(ContentError::Missing));
        assert_eq!(
            validate_content(Some(&serde_json::Value::Null), 10),
            Err(ContentError::Null)
        );
        assert_eq!(
            validate_content(Some(&json!(42)), 10),
            Err(ContentError::NotAString)
        );
    }
}
