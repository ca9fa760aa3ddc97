//! The grouped form of customizations, as stored on disk.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::{ChangeKind, DraftResult};

/// Customizations grouped by kind.
///
/// This is both the draft file format and the document kept in each
/// version snapshot. Each map keeps its keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredState {
    #[serde(default)]
    pub color_customization: Map<String, Value>,

    #[serde(default)]
    pub token_customization: Map<String, Value>,

    #[serde(default)]
    pub semantic_token_customization: Map<String, Value>,

    #[serde(default)]
    pub settings_customization: Map<String, Value>,
}

impl StructuredState {
    pub fn section(&self, kind: ChangeKind) -> &Map<String, Value> {
        match kind {
            ChangeKind::Color => &self.color_customization,
            ChangeKind::Token => &self.token_customization,
            ChangeKind::SemanticToken => &self.semantic_token_customization,
            ChangeKind::Settings => &self.settings_customization,
        }
    }

    pub fn section_mut(&mut self, kind: ChangeKind) -> &mut Map<String, Value> {
        match kind {
            ChangeKind::Color => &mut self.color_customization,
            ChangeKind::Token => &mut self.token_customization,
            ChangeKind::SemanticToken => &mut self.semantic_token_customization,
            ChangeKind::Settings => &mut self.settings_customization,
        }
    }

    /// Overlays `other` key by key.
    pub fn merge(&mut self, other: &StructuredState) {
        for kind in ChangeKind::ALL {
            let target = self.section_mut(kind);
            for (key, value) in other.section(kind) {
                target.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        ChangeKind::ALL.iter().all(|kind| self.section(*kind).is_empty())
    }

    /// Converts to a JSON value for storage.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Reads a state from a JSON value.
    pub fn from_value(value: Value) -> DraftResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Loads a draft file.
    pub fn load(path: &Path) -> DraftResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Saves a draft file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> DraftResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_names() {
        let state: StructuredState = serde_json::from_value(json!({
            "colorCustomization": { "editor.background": "#000000" },
            "settingsCustomization": { "editor.fontSize": 14 }
        }))
        .unwrap();
        assert_eq!(state.section(ChangeKind::Color).len(), 1);
        assert!(state.token_customization.is_empty());
        assert!(!state.is_empty());

        let written = state.to_value();
        assert!(written.get("semanticTokenCustomization").is_some());
    }

    #[test]
    fn test_merge_overwrites_and_adds() {
        let mut base = StructuredState::default();
        base.token_customization.insert("keyword".into(), json!("#569CD6"));
        base.token_customization.insert("comment".into(), json!("#6A9955"));

        let mut other = StructuredState::default();
        other.token_customization.insert("keyword".into(), json!("#FF0000"));
        other.settings_customization.insert("editor.fontFamily".into(), json!("Fira Code"));

        base.merge(&other);
        assert_eq!(base.token_customization["keyword"], json!("#FF0000"));
        assert_eq!(base.token_customization["comment"], json!("#6A9955"));
        assert_eq!(base.settings_customization["editor.fontFamily"], json!("Fira Code"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("draft.json");

        let mut state = StructuredState::default();
        state.color_customization.insert("editor.background".into(), json!("#101010"));
        state.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'));
        assert_eq!(StructuredState::load(&path).unwrap(), state);
    }

    #[test]
    fn test_load_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(StructuredState::load(&path), Err(crate::DraftError::Json(_))));
    }
}
