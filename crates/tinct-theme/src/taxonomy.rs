//! The conceptual token taxonomy.
//!
//! ## Learning: Closed Sets as Enums
//!
//! The set of categories never changes at runtime, so it is an enum rather
//! than a string-keyed map. The compiler then guarantees every `match` covers
//! every category, and a category can index straight into an array.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{FontStyle, ThemeError};

/// An editor-agnostic token kind, the stable key for user customization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Comment,
    Literal,
    Keyword,
    Variable,
    Constant,
    Parameter,
    Function,
    Class,
    Interface,
    Enum,
    Type,
    Number,
    Macro,
    Operator,
    Punctuation,
    Property,
    Annotation,
    Builtin,
    Namespace,
    Tag,
    Attribute,
    EscapeSequence,
    Invalid,
}

impl TokenCategory {
    pub const COUNT: usize = 23;

    /// All categories in taxonomy order.
    pub const ALL: [TokenCategory; Self::COUNT] = [
        TokenCategory::Comment,
        TokenCategory::Literal,
        TokenCategory::Keyword,
        TokenCategory::Variable,
        TokenCategory::Constant,
        TokenCategory::Parameter,
        TokenCategory::Function,
        TokenCategory::Class,
        TokenCategory::Interface,
        TokenCategory::Enum,
        TokenCategory::Type,
        TokenCategory::Number,
        TokenCategory::Macro,
        TokenCategory::Operator,
        TokenCategory::Punctuation,
        TokenCategory::Property,
        TokenCategory::Annotation,
        TokenCategory::Builtin,
        TokenCategory::Namespace,
        TokenCategory::Tag,
        TokenCategory::Attribute,
        TokenCategory::EscapeSequence,
        TokenCategory::Invalid,
    ];

    /// Position of this category in [`TokenCategory::ALL`] and [`TAXONOMY`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The identifier used in customization files.
    pub fn id(self) -> &'static str {
        match self {
            TokenCategory::Comment => "comment",
            TokenCategory::Literal => "literal",
            TokenCategory::Keyword => "keyword",
            TokenCategory::Variable => "variable",
            TokenCategory::Constant => "constant",
            TokenCategory::Parameter => "parameter",
            TokenCategory::Function => "function",
            TokenCategory::Class => "class",
            TokenCategory::Interface => "interface",
            TokenCategory::Enum => "enum",
            TokenCategory::Type => "type",
            TokenCategory::Number => "number",
            TokenCategory::Macro => "macro",
            TokenCategory::Operator => "operator",
            TokenCategory::Punctuation => "punctuation",
            TokenCategory::Property => "property",
            TokenCategory::Annotation => "annotation",
            TokenCategory::Builtin => "builtin",
            TokenCategory::Namespace => "namespace",
            TokenCategory::Tag => "tag",
            TokenCategory::Attribute => "attribute",
            TokenCategory::EscapeSequence => "escapesequence",
            TokenCategory::Invalid => "invalid",
        }
    }

    /// The taxonomy entry for this category.
    pub fn token(self) -> &'static ConceptualToken {
        &TAXONOMY[self.index()]
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TokenCategory {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenCategory::ALL
            .into_iter()
            .find(|category| category.id() == s)
            .ok_or_else(|| ThemeError::UnknownCategory(s.to_string()))
    }
}

/// A category together with its presentation data and default look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConceptualToken {
    pub category: TokenCategory,
    pub display_name: &'static str,
    pub description: &'static str,
    pub default_color: &'static str,
    pub default_style: FontStyle,
}

const fn token(
    category: TokenCategory,
    display_name: &'static str,
    description: &'static str,
    default_color: &'static str,
    default_style: FontStyle,
) -> ConceptualToken {
    ConceptualToken {
        category,
        display_name,
        description,
        default_color,
        default_style,
    }
}

/// One entry per category, in [`TokenCategory::ALL`] order.
pub static TAXONOMY: [ConceptualToken; TokenCategory::COUNT] = [
    token(TokenCategory::Comment, "Comments", "Line and block comments, including doc comments", "#6A9955", FontStyle::Italic),
    token(TokenCategory::Literal, "Strings", "String, template and regular expression literals", "#CE9178", FontStyle::None),
    token(TokenCategory::Keyword, "Keywords", "Control flow keywords and storage modifiers", "#569CD6", FontStyle::None),
    token(TokenCategory::Variable, "Variables", "Local variables and bindings", "#9CDCFE", FontStyle::None),
    token(TokenCategory::Constant, "Constants", "Read-only variables, enum members and language constants", "#4FC1FF", FontStyle::None),
    token(TokenCategory::Parameter, "Parameters", "Function and method parameters", "#9CDCFE", FontStyle::None),
    token(TokenCategory::Function, "Functions", "Function and method names, declarations and calls", "#DCDCAA", FontStyle::None),
    token(TokenCategory::Class, "Classes", "Class names and base classes", "#4EC9B0", FontStyle::None),
    token(TokenCategory::Interface, "Interfaces", "Interface and trait names", "#B8D7A3", FontStyle::None),
    token(TokenCategory::Enum, "Enums", "Enumeration type names", "#4EC9B0", FontStyle::None),
    token(TokenCategory::Type, "Types", "Type aliases, structs and type parameters", "#4EC9B0", FontStyle::None),
    token(TokenCategory::Number, "Numbers", "Numeric literals", "#B5CEA8", FontStyle::None),
    token(TokenCategory::Macro, "Macros", "Macros and preprocessor directives", "#C586C0", FontStyle::None),
    token(TokenCategory::Operator, "Operators", "Arithmetic, logical and assignment operators", "#D4D4D4", FontStyle::None),
    token(TokenCategory::Punctuation, "Punctuation", "Separators, terminators and brackets", "#D4D4D4", FontStyle::None),
    token(TokenCategory::Property, "Properties", "Object properties, fields and keys", "#9CDCFE", FontStyle::None),
    token(TokenCategory::Annotation, "Annotations", "Decorators and annotations", "#DCDCAA", FontStyle::None),
    token(TokenCategory::Builtin, "Built-ins", "Standard library types, functions and language variables", "#4EC9B0", FontStyle::None),
    token(TokenCategory::Namespace, "Namespaces", "Namespaces, modules and packages", "#4EC9B0", FontStyle::None),
    token(TokenCategory::Tag, "Tags", "Markup tag names", "#569CD6", FontStyle::None),
    token(TokenCategory::Attribute, "Attributes", "Markup attribute names", "#9CDCFE", FontStyle::None),
    token(TokenCategory::EscapeSequence, "Escape Sequences", "Character escapes inside literals", "#D7BA7D", FontStyle::None),
    token(TokenCategory::Invalid, "Invalid", "Illegal and deprecated code", "#F44747", FontStyle::Underline),
];
