//! The resolved color and style of every category.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Index;

use crate::{ColorHex, FontStyle, TokenCategory};

/// Color and style of one category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedToken {
    pub color: ColorHex,
    #[serde(default)]
    pub style: FontStyle,
}

impl ResolvedToken {
    pub fn new(color: ColorHex, style: FontStyle) -> Self {
        Self { color, style }
    }

    /// The taxonomy default for a category.
    pub fn default_for(category: TokenCategory) -> Self {
        let token = category.token();
        Self {
            color: ColorHex::builtin(token.default_color),
            style: token.default_style,
        }
    }
}

/// A category → token map that is always fully populated.
///
/// ## Learning: Making Invalid States Unrepresentable
///
/// Backing the map with a fixed-size array indexed by category means there
/// is no way to build one with a missing entry, so lookups never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTokenMap {
    tokens: [ResolvedToken; TokenCategory::COUNT],
}

impl ResolvedTokenMap {
    /// A fresh map holding the taxonomy defaults.
    pub fn defaults() -> Self {
        Self {
            tokens: TokenCategory::ALL.map(ResolvedToken::default_for),
        }
    }

    pub fn get(&self, category: TokenCategory) -> &ResolvedToken {
        &self.tokens[category.index()]
    }

    pub fn set(&mut self, category: TokenCategory, token: ResolvedToken) {
        self.tokens[category.index()] = token;
    }

    /// Iterates in taxonomy order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenCategory, &ResolvedToken)> {
        TokenCategory::ALL.into_iter().zip(self.tokens.iter())
    }
}

impl Default for ResolvedTokenMap {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Index<TokenCategory> for ResolvedTokenMap {
    type Output = ResolvedToken;

    fn index(&self, category: TokenCategory) -> &Self::Output {
        self.get(category)
    }
}

impl Serialize for ResolvedTokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(TokenCategory::COUNT))?;
        for (category, token) in self.iter() {
            map.serialize_entry(category.id(), token)?;
        }
        map.end()
    }
}

/// Missing categories take their defaults; unknown keys are ignored.
impl<'de> Deserialize<'de> for ResolvedTokenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, ResolvedToken>::deserialize(deserializer)?;
        let mut map = Self::defaults();
        for (key, token) in raw {
            if let Ok(category) = key.parse::<TokenCategory>() {
                map.set(category, token);
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_cover_every_category() {
        let map = ResolvedTokenMap::defaults();
        assert_eq!(map.iter().count(), TokenCategory::COUNT);
        assert_eq!(map[TokenCategory::Comment].color.as_str(), "#6A9955");
        for (category, token) in map.iter() {
            assert_eq!(*token, ResolvedToken::default_for(category));
        }
    }

    #[test]
    fn test_set_does_not_touch_shared_defaults() {
        let mut map = ResolvedTokenMap::defaults();
        map.set(
            TokenCategory::Comment,
            ResolvedToken::new(ColorHex::parse("#000000").unwrap(), FontStyle::None),
        );
        let changed: Vec<_> = map
            .iter()
            .filter(|(category, token)| **token != ResolvedToken::default_for(*category))
            .map(|(category, _)| category)
            .collect();
        assert_eq!(changed, vec![TokenCategory::Comment]);
        assert_eq!(ResolvedTokenMap::defaults()[TokenCategory::Comment].style, FontStyle::Italic);
    }

    #[test]
    fn test_deserialize_fills_missing_categories() {
        let map: ResolvedTokenMap = serde_json::from_value(json!({
            "keyword": { "color": "#FF00FF", "style": "bold" },
            "nonsense": { "color": "#000000" }
        }))
        .unwrap();
        assert_eq!(map[TokenCategory::Keyword].style, FontStyle::Bold);
        assert_eq!(map[TokenCategory::Number], ResolvedToken::default_for(TokenCategory::Number));

        let written = serde_json::to_value(&map).unwrap();
        assert_eq!(written["keyword"], json!({ "color": "#FF00FF", "style": "bold" }));
        assert_eq!(written.as_object().unwrap().len(), TokenCategory::COUNT);
    }
}
