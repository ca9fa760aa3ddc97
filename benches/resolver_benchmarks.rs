//! Benchmarks for theme resolution and compilation.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Map, Value};
use tinct_draft::{ChangeKind, DraftChange, DraftState};
use tinct_theme::{
    resolve, resolve_theme, ResolvedTokenMap, ScopeRule, ScopeSettings, ThemeCompiler, ThemeDocument,
    ThemeKind, ThemeOverrides,
};

const SCOPES: &[&str] = &[
    "comment",
    "string.quoted.double",
    "keyword.control.flow",
    "entity.name.function",
    "variable.other.readwrite",
    "constant.numeric.integer",
    "entity.name.type.struct",
    "support.type.property-name.json",
    "meta.embedded.block",
    "markup.heading",
];

/// Generates a theme with `rules` TextMate rules and a handful of semantic rules.
fn generate_theme(rules: usize) -> ThemeDocument {
    let mut theme = ThemeDocument::new("Bench", ThemeKind::Dark);
    theme.token_colors = (0..rules)
        .map(|i| {
            let scopes = vec![
                SCOPES[i % SCOPES.len()].to_string(),
                format!("source.lang{i}.{}", SCOPES[(i + 3) % SCOPES.len()]),
            ];
            let settings = ScopeSettings {
                foreground: Some(format!("#{:06X}", (i * 7919) % 0xFF_FFFF)),
                font_style: (i % 4 == 0).then(|| "italic".to_string()),
                ..Default::default()
            };
            ScopeRule::new(scopes, settings)
        })
        .collect();
    theme.semantic_token_colors = [
        ("variable.readonly", json!("#4FC1FF")),
        ("function", json!({ "foreground": "#DCDCAA", "bold": true })),
        ("comment.documentation", json!("#6A9955")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect::<Map<String, Value>>();
    theme
}

/// Benchmarks both resolution passes over growing rule counts.
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [10, 100, 1000, 5000].iter() {
        let theme = generate_theme(*size);

        group.bench_with_input(BenchmarkId::new("theme", size), &theme, |b, theme| {
            b.iter(|| black_box(resolve_theme(black_box(theme))))
        });
    }

    group.bench_function("empty", |b| b.iter(|| black_box(resolve(&Map::new(), &[]))));

    group.finish();
}

/// Benchmarks compiling a resolved map on top of a large base theme.
fn bench_compile(c: &mut Criterion) {
    let compiler = ThemeCompiler::new("Bench Out", ThemeKind::Dark).unwrap();
    let base = generate_theme(1000);
    let map = ResolvedTokenMap::defaults();
    let overrides = ThemeOverrides::default();

    c.bench_function("compile_1000_rules", |b| {
        b.iter(|| black_box(compiler.compile(black_box(&base), &map, &overrides)))
    });

    c.bench_function("compile_then_resolve", |b| {
        b.iter(|| {
            let compiled = compiler.compile(&base, &map, &overrides);
            black_box(resolve_theme(&compiled.document))
        })
    });
}

/// Benchmarks draft edits with many distinct and repeated keys.
fn bench_draft_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("draft_apply");

    for size in [100, 1000, 10000].iter() {
        let changes: Vec<DraftChange> = (0..*size)
            .map(|i| DraftChange::new(ChangeKind::Color, format!("color.{}", i % 500), json!(format!("#{:06X}", i))))
            .collect();

        group.bench_with_input(BenchmarkId::new("changes", size), &changes, |b, changes| {
            b.iter(|| {
                let mut draft = DraftState::new();
                draft.apply(black_box(changes.clone()));
                black_box(draft)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_compile, bench_draft_apply);
criterion_main!(benches);
