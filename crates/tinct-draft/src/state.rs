//! The in-memory draft.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::{ChangeKind, DraftChange, DraftKey, StructuredState};

/// Ordered set of pending changes, unique per `(kind, key)`.
///
/// ## Design
///
/// Values live in a `HashMap` for O(1) lookup by key; a side list remembers
/// the order keys were first added. Replacing a value leaves its position
/// alone, so the UI can list edits in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DraftChange>", into = "Vec<DraftChange>")]
pub struct DraftState {
    values: HashMap<DraftKey, Value>,
    order: Vec<DraftKey>,
}

impl DraftState {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies changes in order and returns how many altered the draft.
    ///
    /// A new key is appended, a different value replaces the old one in
    /// place, and an identical value is a no-op.
    pub fn apply(&mut self, changes: impl IntoIterator<Item = DraftChange>) -> usize {
        let mut altered = 0;
        for change in changes {
            let (key, value) = change.into_parts();
            match self.values.get_mut(&key) {
                Some(existing) if *existing == value => {}
                Some(existing) => {
                    *existing = value;
                    altered += 1;
                }
                None => {
                    self.order.push(key.clone());
                    self.values.insert(key, value);
                    altered += 1;
                }
            }
        }
        if altered > 0 {
            debug!("Draft updated: {altered} change(s), {} pending", self.len());
        }
        altered
    }

    /// Removes one change. Returns false if there was nothing to remove.
    pub fn remove(&mut self, kind: ChangeKind, key: &str) -> bool {
        let target = DraftKey::new(kind, key);
        if self.values.remove(&target).is_none() {
            return false;
        }
        self.order.retain(|k| *k != target);
        true
    }

    /// Drops every pending change.
    pub fn discard_all(&mut self) {
        self.values.clear();
        self.order.clear();
    }

    pub fn get(&self, kind: ChangeKind, key: &str) -> Option<&Value> {
        self.values.get(&DraftKey::new(kind, key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates over `(key, value)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&DraftKey, &Value)> {
        self.order.iter().filter_map(|key| self.values.get(key).map(|value| (key, value)))
    }

    /// The pending changes as a list, in insertion order.
    pub fn changes(&self) -> Vec<DraftChange> {
        self.iter()
            .map(|(key, value)| DraftChange::new(key.kind, key.key.clone(), value.clone()))
            .collect()
    }

    /// Applies every change of another draft on top of this one.
    pub fn merge(&mut self, other: &DraftState) -> usize {
        self.apply(other.changes())
    }

    /// Only the changes whose value differs from `committed`.
    pub fn pending_against(&self, committed: &StructuredState) -> Vec<DraftChange> {
        self.iter()
            .filter(|(key, value)| committed.section(key.kind).get(&key.key) != Some(*value))
            .map(|(key, value)| DraftChange::new(key.kind, key.key.clone(), value.clone()))
            .collect()
    }

    /// Groups the changes into the four persisted maps.
    pub fn to_structured_state(&self) -> StructuredState {
        let mut state = StructuredState::default();
        for (key, value) in self.iter() {
            state.section_mut(key.kind).insert(key.key.clone(), value.clone());
        }
        state
    }

    /// Flattens a structured state into a draft, kind by kind.
    pub fn from_structured_state(state: &StructuredState) -> Self {
        let mut draft = Self::new();
        for kind in ChangeKind::ALL {
            draft.apply(
                state
                    .section(kind)
                    .iter()
                    .map(|(key, value)| DraftChange::new(kind, key.clone(), value.clone())),
            );
        }
        draft
    }
}

impl From<Vec<DraftChange>> for DraftState {
    fn from(changes: Vec<DraftChange>) -> Self {
        let mut draft = Self::new();
        draft.apply(changes);
        draft
    }
}

impl From<DraftState> for Vec<DraftChange> {
    fn from(draft: DraftState) -> Self {
        draft.changes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn color(key: &str, value: &str) -> DraftChange {
        DraftChange::new(ChangeKind::Color, key, json!(value))
    }

    #[test]
    fn test_apply_same_change_twice_is_idempotent() {
        let mut once = DraftState::new();
        once.apply([color("editor.background", "#000000")]);

        let mut twice = DraftState::new();
        assert_eq!(twice.apply([color("editor.background", "#000000")]), 1);
        assert_eq!(twice.apply([color("editor.background", "#000000")]), 0);

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
    }

    #[test]
    fn test_replace_not_duplicate() {
        let mut draft = DraftState::new();
        draft.apply([
            color("editor.background", "#000000"),
            color("editor.foreground", "#FFFFFF"),
            color("editor.background", "#111111"),
        ]);

        assert_eq!(draft.len(), 2);
        assert_eq!(draft.get(ChangeKind::Color, "editor.background"), Some(&json!("#111111")));
        let keys: Vec<_> = draft.iter().map(|(k, _)| k.key.as_str()).collect();
        assert_eq!(keys, ["editor.background", "editor.foreground"]);
    }

    #[test]
    fn test_same_key_different_kind_is_distinct() {
        let mut draft = DraftState::new();
        draft.apply([
            DraftChange::new(ChangeKind::Token, "function", json!("#DCDCAA")),
            DraftChange::new(ChangeKind::SemanticToken, "function", json!("#DCDCAA")),
        ]);
        assert_eq!(draft.len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut draft = DraftState::new();
        draft.apply([color("a", "#000"), color("b", "#111"), color("c", "#222")]);

        assert!(draft.remove(ChangeKind::Color, "b"));
        assert!(!draft.remove(ChangeKind::Color, "b"));
        assert!(!draft.remove(ChangeKind::Settings, "a"));

        let keys: Vec<_> = draft.iter().map(|(k, _)| k.key.as_str()).collect();
        assert_eq!(keys, ["a", "c"]);
    }

    #[test]
    fn test_discard_all() {
        let mut draft = DraftState::new();
        draft.apply([color("a", "#000"), color("b", "#111")]);
        draft.discard_all();
        assert!(draft.is_empty());
        assert_eq!(draft.get(ChangeKind::Color, "a"), None);
    }

    #[test]
    fn test_pending_against_committed() {
        let mut committed = StructuredState::default();
        committed.color_customization.insert("a".into(), json!("#000"));

        let mut draft = DraftState::new();
        draft.apply([color("a", "#000"), color("b", "#111")]);

        let pending = draft.pending_against(&committed);
        assert_eq!(pending, vec![color("b", "#111")]);
    }

    #[test]
    fn test_merge_overlays_other_draft() {
        let mut draft = DraftState::new();
        draft.apply([color("a", "#000")]);
        let mut other = DraftState::new();
        other.apply([color("a", "#FFF"), color("b", "#111")]);

        assert_eq!(draft.merge(&other), 2);
        assert_eq!(draft.get(ChangeKind::Color, "a"), Some(&json!("#FFF")));
    }

    #[test]
    fn test_serializes_as_change_list() {
        let mut draft = DraftState::new();
        draft.apply([color("a", "#000")]);
        let written = serde_json::to_value(&draft).unwrap();
        assert_eq!(written, json!([{ "type": "color", "key": "a", "value": "#000" }]));

        let read: DraftState = serde_json::from_value(written).unwrap();
        assert_eq!(read, draft);
    }

    fn change_strategy() -> impl Strategy<Value = DraftChange> {
        let kind = prop_oneof![
            Just(ChangeKind::Color),
            Just(ChangeKind::Token),
            Just(ChangeKind::SemanticToken),
            Just(ChangeKind::Settings),
        ];
        (kind, "[a-c]{1,2}", 0u8..4).prop_map(|(kind, key, value)| DraftChange::new(kind, key, json!(value)))
    }

    proptest! {
        #[test]
        fn prop_keys_stay_unique(changes in proptest::collection::vec(change_strategy(), 0..40)) {
            let mut draft = DraftState::new();
            draft.apply(changes.clone());

            let mut seen = std::collections::HashSet::new();
            for (key, _) in draft.iter() {
                prop_assert!(seen.insert(key.clone()));
            }
            for change in &changes {
                prop_assert!(draft.get(change.kind, &change.key).is_some());
            }
        }

        #[test]
        fn prop_reapplying_is_a_no_op(changes in proptest::collection::vec(change_strategy(), 0..40)) {
            let mut draft = DraftState::new();
            draft.apply(changes);
            let snapshot = draft.clone();
            prop_assert_eq!(draft.apply(snapshot.changes()), 0);
            prop_assert_eq!(draft, snapshot);
        }

        #[test]
        fn prop_structured_round_trip(changes in proptest::collection::vec(change_strategy(), 0..40)) {
            let mut draft = DraftState::new();
            draft.apply(changes);
            let state = draft.to_structured_state();
            prop_assert_eq!(DraftState::from_structured_state(&state).to_structured_state(), state);
        }
    }
}
