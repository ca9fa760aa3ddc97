//! A single pending edit.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What an edit customizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    /// Workbench color, keyed by color id (`editor.background`)
    Color,
    /// Conceptual token, keyed by category id (`keyword`)
    Token,
    /// Raw semantic rule, keyed by selector (`variable.readonly`)
    SemanticToken,
    /// Editor setting, keyed by setting id (`editor.fontSize`)
    Settings,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Color,
        ChangeKind::Token,
        ChangeKind::SemanticToken,
        ChangeKind::Settings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Color => "color",
            ChangeKind::Token => "token",
            ChangeKind::SemanticToken => "semanticToken",
            ChangeKind::Settings => "settings",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a change; a draft holds at most one change per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftKey {
    pub kind: ChangeKind,
    pub key: String,
}

impl DraftKey {
    pub fn new(kind: ChangeKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

/// One pending edit, as sent by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub key: String,
    pub value: Value,
}

impl DraftChange {
    pub fn new(kind: ChangeKind, key: impl Into<String>, value: Value) -> Self {
        Self {
            kind,
            key: key.into(),
            value,
        }
    }

    /// Splits the change into its identity and value.
    pub fn into_parts(self) -> (DraftKey, Value) {
        (
            DraftKey {
                kind: self.kind,
                key: self.key,
            },
            self.value,
        )
    }
}
