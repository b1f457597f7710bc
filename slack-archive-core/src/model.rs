use std::fmt;

use serde::Deserialize;

/// Slack writes `ts` as a string (`"1710705600.000200"`), older tooling as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    Number(f64),
}

impl RawTimestamp {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Text(text) => text.trim().parse::<f64>().ok(),
            Self::Number(value) => Some(*value),
        }
        .filter(|value| value.is_finite())
    }
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One record of a channel export. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub user: String,
    #[serde(default)]
    pub text: Option<String>,
    pub ts: RawTimestamp,
    #[serde(default)]
    pub files: Vec<MessageFile>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

impl Message {
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub avatar_hash: String,
    pub image_72: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageFile {
    pub id: String,
    #[serde(default)]
    pub filetype: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url_private_download: Option<String>,
    #[serde(default)]
    pub thumb_960: Option<String>,
    #[serde(default)]
    pub thumb_video: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

impl MessageFile {
    /// Deleted files, and files past the workspace retention limit, keep only their id.
    pub fn is_unavailable(&self) -> bool {
        matches!(self.mode.as_deref(), Some("tombstone" | "hidden_by_limit"))
    }

    pub fn is_image(&self) -> bool {
        self.mimetype
            .as_deref()
            .is_some_and(|mimetype| mimetype.starts_with("image"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetail {
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDetail {
    pub id: String,
    pub path: String,
    pub thumbnail: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::model::{Message, RawTimestamp};

    #[test]
    fn parses_slack_record_with_string_timestamp() {
        let raw = r#"{"type":"message","user":"U1","text":"hi","ts":"1710705600.000200","user_profile":{"name":"alice","avatar_hash":"abc","image_72":"https://a/72.jpg","real_name":"Alice"}}"#;
        let message: Message = serde_json::from_str(raw).expect("parse");
        assert_eq!(message.user, "U1");
        assert!(message.has_text());
        assert!(message.files.is_empty());
        assert_eq!(message.ts, RawTimestamp::from("1710705600.000200"));
        assert_eq!(
            message.user_profile.map(|profile| profile.name),
            Some("alice".to_string())
        );
    }

    #[test]
    fn accepts_numeric_timestamp_and_missing_text() {
        let message: Message =
            serde_json::from_str(r#"{"user":"U1","ts":1710705600.5}"#).expect("parse");
        assert!(!message.has_text());
        assert_eq!(message.ts.seconds(), Some(1_710_705_600.5));
    }

    #[test]
    fn record_without_user_is_rejected() {
        let err = serde_json::from_str::<Message>(r#"{"text":"orphan","ts":"1"}"#)
            .expect_err("must fail");
        assert!(err.to_string().contains("user"));
    }

    #[test]
    fn garbage_timestamp_has_no_seconds() {
        assert_eq!(RawTimestamp::from("yesterday").seconds(), None);
    }
}
