//! Theme documents in the editor's native JSON shape.
//!
//! Only the fields the engine reads or writes are typed. Everything else
//! (`$schema`, `include`, extra rule settings) rides along in `extra` maps so
//! a compiled theme keeps whatever the base theme's author put there.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::debug;

use crate::{ColorHex, FontStyle, ResolvedToken, ThemeResult};

/// Light or dark base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[serde(alias = "vs", alias = "hcLight")]
    Light,
    #[default]
    #[serde(alias = "vs-dark", alias = "hc", alias = "hcDark", alias = "hc-black")]
    Dark,
}

/// A color theme file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeDocument {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: ThemeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_highlighting: Option<bool>,

    /// Workbench colors, `key → hex`
    #[serde(default)]
    pub colors: Map<String, Value>,

    /// Legacy TextMate rules; later entries win
    #[serde(default, deserialize_with = "lenient_rules")]
    pub token_colors: Vec<ScopeRule>,

    /// Semantic rules, `selector → hex | {foreground, fontStyle}`, in document order
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub semantic_token_colors: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ThemeDocument {
    /// Creates an empty theme.
    pub fn new(name: impl Into<String>, kind: ThemeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// Parses a theme from JSON text.
    pub fn from_json(text: &str) -> ThemeResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a theme from a file.
    pub fn load(path: &Path) -> ThemeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Pretty-printed JSON, as written to disk.
    pub fn to_json_pretty(&self) -> ThemeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Saves the theme to a file.
    pub fn save(&self, path: &Path) -> ThemeResult<()> {
        let content = self.to_json_pretty()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Reads `tokenColors` one rule at a time, dropping rules that do not parse.
///
/// A malformed rule never costs the rest of the theme.
fn lenient_rules<'de, D>(deserializer: D) -> Result<Vec<ScopeRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            debug!("Ignoring tokenColors that is not a rule list: {other}");
            return Ok(Vec::new());
        }
    };

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value::<ScopeRule>(item) {
            Ok(rule) => Some(rule),
            Err(err) => {
                debug!("Dropping malformed TextMate rule #{position}: {err}");
                None
            }
        })
        .collect())
}

/// A legacy TextMate rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, alias = "scopes", skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeSelector>,

    #[serde(default)]
    pub settings: ScopeSettings,
}

impl ScopeRule {
    /// Builds a rule for a set of scopes.
    pub fn new(scopes: Vec<String>, settings: ScopeSettings) -> Self {
        Self {
            name: None,
            scope: Some(ScopeSelector(scopes)),
            settings,
        }
    }

    /// The rule's scopes; empty for global rules.
    pub fn scopes(&self) -> &[String] {
        self.scope.as_ref().map(ScopeSelector::as_slice).unwrap_or(&[])
    }
}

/// The `scope` field of a rule: one string, a comma-separated list, or an array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawScope", into = "Vec<String>")]
pub struct ScopeSelector(Vec<String>);

impl ScopeSelector {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScope {
    Single(String),
    Multiple(Vec<String>),
}

impl From<RawScope> for ScopeSelector {
    fn from(raw: RawScope) -> Self {
        let scopes = match raw {
            RawScope::Single(s) => s
                .split(',')
                .map(str::trim)
                .filter(|scope| !scope.is_empty())
                .map(String::from)
                .collect(),
            RawScope::Multiple(v) => v,
        };
        Self(scopes)
    }
}

impl From<ScopeSelector> for Vec<String> {
    fn from(selector: ScopeSelector) -> Self {
        selector.0
    }
}

/// Settings of a TextMate rule.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScopeSettings {
    /// Reads the rule as a token, `None` when the foreground is missing or not hex.
    ///
    /// A missing `fontStyle` means no style.
    pub fn to_token(&self) -> Option<ResolvedToken> {
        let color = ColorHex::parse(self.foreground.as_deref()?)?;
        let style = self.font_style.as_deref().map(FontStyle::parse).unwrap_or_default();
        Some(ResolvedToken { color, style })
    }

    pub fn from_token(token: &ResolvedToken) -> Self {
        Self {
            foreground: Some(token.color.to_string()),
            font_style: token.style.to_font_style().map(String::from),
            extra: Map::new(),
        }
    }
}

/// A semantic rule value, decoded once at the document boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticValue {
    /// `"selector": "#hex"`
    Plain(ColorHex),
    /// `"selector": { "foreground": "#hex", "fontStyle": "..." }`
    Styled(ColorHex, FontStyle),
}

impl SemanticValue {
    /// Decodes a raw JSON value. Returns `None` for malformed values.
    ///
    /// The object form accepts either a `fontStyle` string or the boolean
    /// `bold`/`italic`/`underline` flags; with neither, the style is none.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => ColorHex::parse(s).map(SemanticValue::Plain),
            Value::Object(obj) => {
                let color = obj
                    .get("foreground")
                    .and_then(Value::as_str)
                    .and_then(ColorHex::parse)?;
                let style = match obj.get("fontStyle").and_then(Value::as_str) {
                    Some(font_style) => FontStyle::parse(font_style),
                    None => {
                        let flag = |name| obj.get(name).and_then(Value::as_bool).unwrap_or(false);
                        FontStyle::from_flags(flag("bold"), flag("italic"), flag("underline"))
                    }
                };
                Some(SemanticValue::Styled(color, style))
            }
            _ => None,
        }
    }

    /// Encodes the value in the shortest form that keeps its meaning.
    pub fn to_json(&self) -> Value {
        match self {
            SemanticValue::Plain(color) => Value::String(color.to_string()),
            SemanticValue::Styled(color, style) => {
                let mut obj = Map::new();
                obj.insert("foreground".into(), Value::String(color.to_string()));
                if let Some(font_style) = style.to_font_style() {
                    obj.insert("fontStyle".into(), Value::String(font_style.into()));
                }
                Value::Object(obj)
            }
        }
    }

    pub fn from_token(token: &ResolvedToken) -> Self {
        if token.style.is_none() {
            SemanticValue::Plain(token.color.clone())
        } else {
            SemanticValue::Styled(token.color.clone(), token.style)
        }
    }

    pub fn to_token(&self) -> ResolvedToken {
        match self {
            SemanticValue::Plain(color) => ResolvedToken::new(color.clone(), FontStyle::None),
            SemanticValue::Styled(color, style) => ResolvedToken::new(color.clone(), *style),
        }
    }
}
