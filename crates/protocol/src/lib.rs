//! Wire types shared by the file service, the chat bridge and the HTTP layer.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub const ACCESS_DENIED_PLACEHOLDER: &str = "// Access Denied";
pub const NOT_FOUND_PLACEHOLDER: &str = "// File not found";
pub const ROOT_NOT_FOUND_MESSAGE: &str = "Directory not found";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// One node of the exposed directory tree.
///
/// `path` is always relative to the root and uses `/` as separator. `children` is present
/// only for folders.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Entry>>,
}

impl Entry {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            path: path.into(),
            children: None,
        }
    }

    pub fn folder(name: impl Into<String>, path: impl Into<String>, children: Vec<Entry>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
            path: path.into(),
            children: Some(children),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TreeResponse {
    pub tree: Vec<Entry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TreeResponse {
    pub fn ok(tree: Vec<Entry>, root: impl Into<String>) -> Self {
        Self {
            tree,
            root: Some(root.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            tree: Vec::new(),
            root: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReadQuery {
    pub filepath: String,
}

/// Read results always carry `content`; failures are embedded as commented placeholders.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    pub content: String,
}

impl ReadResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn access_denied() -> Self {
        Self::new(ACCESS_DENIED_PLACEHOLDER)
    }

    pub fn not_found() -> Self {
        Self::new(NOT_FOUND_PLACEHOLDER)
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::new(format!("// Error: {message}"))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub filename: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SaveResponse {
    pub status: SaveStatus,
    pub message: String,
}

impl SaveResponse {
    pub fn saved(filename: &str) -> Self {
        Self {
            status: SaveStatus::Success,
            message: format!("Saved {filename}"),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SaveStatus::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Model,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

/// A single part of a conversation turn.
///
/// Shapes other than text and inline data are kept as raw JSON and forwarded unchanged.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

fn default_parts() -> Vec<ContentPart> {
    vec![ContentPart::text("")]
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversationTurn {
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_parts")]
    pub parts: Vec<ContentPart>,
}

impl ConversationTurn {
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self { role, parts }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub files: Vec<FileAttachment>,
}

/// Serialized as `{"result": ...}` or `{"error": ...}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatResponse {
    Result(String),
    Error(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub root: String,
    pub root_exists: bool,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
