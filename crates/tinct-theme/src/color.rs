//! Colors and font styles as they are written in theme files.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ThemeError;

/// A `#`-prefixed hex color exactly as it appears in a theme file.
///
/// Accepted forms are `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`. The
/// original spelling is kept, so `#abcdef` and `#ABCDEF` are different
/// values; themes are compared by what they say, not by what they render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorHex(String);

impl ColorHex {
    /// Parses a color, returning `None` for anything that is not hex.
    pub fn parse(value: &str) -> Option<Self> {
        let digits = value.strip_prefix('#')?;
        let known_length = matches!(digits.len(), 3 | 4 | 6 | 8);
        if known_length && digits.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(value.to_string()))
        } else {
            None
        }
    }

    /// Wraps a built-in color literal. Only used for taxonomy defaults,
    /// which are checked by the taxonomy tests.
    pub(crate) fn builtin(value: &'static str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ColorHex {
    type Error = ThemeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(ThemeError::InvalidColor(value))
    }
}

impl From<ColorHex> for String {
    fn from(color: ColorHex) -> Self {
        color.0
    }
}

impl fmt::Display for ColorHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The canonical style of a token.
///
/// Theme files allow any space-separated mix of modifiers, but a category
/// carries exactly one canonical style. When several modifiers are present
/// the first one in [`FontStyle::PRECEDENCE`] wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    None,
    Bold,
    Italic,
    Underline,
}

impl FontStyle {
    /// Tie-break order when a style string names more than one modifier.
    pub const PRECEDENCE: [FontStyle; 3] = [FontStyle::Italic, FontStyle::Bold, FontStyle::Underline];

    /// Parses a `fontStyle` string such as `"bold italic"`.
    ///
    /// Unknown words are ignored; a string with no known modifier is `None`.
    pub fn parse(value: &str) -> Self {
        let words: Vec<&str> = value.split_whitespace().collect();
        Self::PRECEDENCE
            .into_iter()
            .find(|style| words.iter().any(|word| word.eq_ignore_ascii_case(style.as_str())))
            .unwrap_or(FontStyle::None)
    }

    /// Folds the boolean form (`"bold": true`, ...) used by semantic rules.
    pub fn from_flags(bold: bool, italic: bool, underline: bool) -> Self {
        if italic {
            FontStyle::Italic
        } else if bold {
            FontStyle::Bold
        } else if underline {
            FontStyle::Underline
        } else {
            FontStyle::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::None => "none",
            FontStyle::Bold => "bold",
            FontStyle::Italic => "italic",
            FontStyle::Underline => "underline",
        }
    }

    /// The `fontStyle` value to write into a theme, `None` when nothing
    /// should be written.
    pub fn to_font_style(self) -> Option<&'static str> {
        match self {
            FontStyle::None => None,
            style => Some(style.as_str()),
        }
    }

    pub fn is_none(self) -> bool {
        self == FontStyle::None
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
