//! Applies customizations to a base theme.
//!
//! The base theme is resolved to one token per category, token
//! customizations are laid over that map, and the compiler turns the result
//! back into rules. Color and semantic customizations are passed to the
//! compiler as raw overrides.

use serde_json::Value;
use tinct_draft::StructuredState;
use tinct_theme::{
    resolve_theme, ColorHex, CompiledTheme, FontStyle, ResolvedTokenMap, ThemeCompiler, ThemeDocument,
    ThemeOverrides, TokenCategory,
};
use tracing::warn;

/// The base theme's resolved tokens with token customizations applied.
///
/// A plain hex value replaces only the color. An object may set `foreground`
/// (or `color`) and `fontStyle` (or `style`); fields it leaves out keep their
/// resolved value.
pub fn effective_tokens(base: &ThemeDocument, state: &StructuredState) -> ResolvedTokenMap {
    let mut map = resolve_theme(base);

    for (key, value) in &state.token_customization {
        let Ok(category) = key.parse::<TokenCategory>() else {
            warn!("Skipping customization for unknown token category {key:?}");
            continue;
        };
        let mut token = map[category].clone();

        match value {
            Value::String(hex) => match ColorHex::parse(hex) {
                Some(color) => token.color = color,
                None => {
                    warn!("Skipping {key}: {hex:?} is not a hex color");
                    continue;
                }
            },
            Value::Object(obj) => {
                let color = obj.get("foreground").or_else(|| obj.get("color")).and_then(Value::as_str);
                if let Some(hex) = color {
                    match ColorHex::parse(hex) {
                        Some(color) => token.color = color,
                        None => {
                            warn!("Skipping {key}: {hex:?} is not a hex color");
                            continue;
                        }
                    }
                }
                let style = obj.get("fontStyle").or_else(|| obj.get("style")).and_then(Value::as_str);
                if let Some(style) = style {
                    token.style = FontStyle::parse(style);
                }
            }
            _ => {
                warn!("Skipping {key}: unsupported value {value}");
                continue;
            }
        }
        map.set(category, token);
    }
    map
}

/// Compiles the output theme for `base` with `state` applied.
pub fn build_theme(compiler: &ThemeCompiler, base: &ThemeDocument, state: &StructuredState) -> CompiledTheme {
    let map = effective_tokens(base, state);
    let overrides = ThemeOverrides {
        colors: state.color_customization.clone(),
        semantic: state.semantic_token_customization.clone(),
    };
    compiler.compile(base, &map, &overrides)
}
