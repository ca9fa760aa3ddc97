//! # Tinct - Color Theme Customization
//!
//! Resolves editor color themes into conceptual token colors, compiles
//! customizations back into theme files, and keeps a numbered history of
//! committed customizations.
//!
//! ## Quick Start
//!
//! ```bash
//! # Show what a theme does to each token category
//! cargo run -- resolve themes/dark_plus.json
//!
//! # Compile a customized copy
//! cargo run -- compile themes/dark_plus.json --name "My Theme" --customizations custom.json
//!
//! # Run a session over stdio for an editor extension
//! cargo run -- serve --extension-dir path/to/extension
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tinct_core::{serve, Config, FsHost, HostLink, Session, VersionStore};
use tinct_draft::StructuredState;
use tinct_theme::{resolve_theme, ThemeCompiler, ThemeDocument, ThemeKind};

/// Tinct - color theme customization for code editors
#[derive(Parser, Debug)]
#[command(name = "tinct")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved color and style of every token category
    Resolve {
        /// Theme file
        theme: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compile a theme with customizations applied
    Compile {
        /// Base theme file
        theme: PathBuf,

        /// Output theme name (defaults to the configured name)
        #[arg(short, long)]
        name: Option<String>,

        /// Output theme kind (defaults to the configured kind)
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,

        /// Customizations file (colorCustomization, tokenCustomization, ...)
        #[arg(long, value_name = "FILE")]
        customizations: Option<PathBuf>,

        /// Directory to write the theme into
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },

    /// Inspect or move the version history
    Versions {
        /// Version store directory (defaults to the configured root)
        #[arg(long, value_name = "DIR", global = true)]
        store: Option<PathBuf>,

        #[command(subcommand)]
        action: VersionAction,
    },

    /// Serve a session over stdin/stdout as line-delimited JSON
    Serve {
        /// Extension directory holding package.json and themes/
        #[arg(long, value_name = "DIR")]
        extension_dir: Option<PathBuf>,

        /// Ask the peer for theme and settings operations instead of using the filesystem
        #[arg(long)]
        remote_host: bool,
    },
}

#[derive(Subcommand, Debug)]
enum VersionAction {
    /// List versions on disk
    List,
    /// Commit a customizations file as a new version
    Save { file: PathBuf },
    /// Make a version current
    Restore { version: u32 },
    /// Make the base current
    Reset,
    /// Print a version without restoring it
    Show { version: u32 },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum KindArg {
    Dark,
    Light,
}

impl From<KindArg> for ThemeKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Dark => ThemeKind::Dark,
            KindArg::Light => ThemeKind::Light,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // stdout carries protocol frames in `serve`, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    tracing::info!("Starting Tinct v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path).with_context(|| format!("reading {}", path.display()))?,
        None => Config::load(),
    };

    match args.command {
        Commands::Resolve { theme, json } => resolve_command(&theme, json),
        Commands::Compile {
            theme,
            name,
            kind,
            customizations,
            out,
        } => {
            let name = name.unwrap_or_else(|| config.theme.name.clone());
            let kind = kind.map(ThemeKind::from).unwrap_or(config.theme.kind);
            compile_command(&theme, &name, kind, customizations.as_deref(), &out)
        }
        Commands::Versions { store, action } => {
            let root = match store {
                Some(root) => root,
                None => config.storage.root_dir()?,
            };
            versions_command(VersionStore::new(root), action).await
        }
        Commands::Serve {
            extension_dir,
            remote_host,
        } => serve_command(&config, extension_dir, remote_host).await,
    }
}

fn resolve_command(theme: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let document = ThemeDocument::load(theme).with_context(|| format!("reading {}", theme.display()))?;
    let map = resolve_theme(&document);

    if json {
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }
    for (category, token) in map.iter() {
        println!("{:<16} {:<10} {}", category.id(), token.color, token.style);
    }
    Ok(())
}

fn compile_command(
    theme: &std::path::Path,
    name: &str,
    kind: ThemeKind,
    customizations: Option<&std::path::Path>,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    let compiler = ThemeCompiler::new(name, kind)?;
    let base = ThemeDocument::load(theme).with_context(|| format!("reading {}", theme.display()))?;
    let state = match customizations {
        Some(path) => StructuredState::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => StructuredState::default(),
    };

    let compiled = tinct_core::build_theme(&compiler, &base, &state);
    let path = out.join(&compiled.file_name);
    compiled.document.save(&path)?;
    println!("{}", path.display());
    Ok(())
}

async fn versions_command(store: VersionStore, action: VersionAction) -> anyhow::Result<()> {
    match action {
        VersionAction::List => {
            let listing = store.list_versions().await?;
            println!(
                "latest {}, current {}",
                listing.meta.latest_version, listing.meta.current_version
            );
            for version in listing.versions {
                let marker = if version == listing.meta.current_version { "*" } else { " " };
                println!("{marker} {version:03}");
            }
        }
        VersionAction::Save { file } => {
            let state = StructuredState::load(&file).with_context(|| format!("reading {}", file.display()))?;
            store.init_base(&StructuredState::default()).await?;
            let meta = store.save_new_version(&state).await?;
            println!("saved version {}", meta.latest_version);
        }
        VersionAction::Restore { version } => {
            let (meta, _) = store.restore_version(version).await?;
            println!("current version {}", meta.current_version);
        }
        VersionAction::Reset => {
            store.reset_to_base().await?;
            println!("current version 0");
        }
        VersionAction::Show { version } => {
            let state = store.load_version(version).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }
    Ok(())
}

async fn serve_command(config: &Config, extension_dir: Option<PathBuf>, remote_host: bool) -> anyhow::Result<()> {
    let store = Arc::new(VersionStore::new(config.storage.root_dir()?));
    let compiler = ThemeCompiler::new(config.theme.name.clone(), config.theme.kind)?;
    let preview = config.preview.clone();
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    if remote_host {
        let (link, host) = HostLink::new(config.host.request_timeout());
        serve(reader, writer, Some(link), async move {
            Session::open(host, store, compiler, &preview).await
        })
        .await?;
        return Ok(());
    }

    let dir = extension_dir
        .or_else(|| config.host.extension_dir.clone())
        .context("serve needs --extension-dir or host.extension_dir in the config")?;
    let mut host = FsHost::new(dir);
    if let Some(theme) = &config.host.active_theme {
        host = host.with_active_theme(theme);
    }
    if let Some(settings) = &config.host.settings_path {
        host = host.with_settings_path(settings);
    }
    serve(reader, writer, None, async move {
        Session::open(host, store, compiler, &preview).await
    })
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["tinct", "resolve", "theme.json"]);
        assert_eq!(args.verbose, 0);
        match args.command {
            Commands::Resolve { theme, json } => {
                assert_eq!(theme, PathBuf::from("theme.json"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_args_compile() {
        let args = Args::parse_from(["tinct", "-vv", "compile", "base.json", "--name", "Mine", "--kind", "light"]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Commands::Compile { name, kind, out, .. } => {
                assert_eq!(name.as_deref(), Some("Mine"));
                assert_eq!(kind, Some(KindArg::Light));
                assert_eq!(out, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_args_versions() {
        let args = Args::parse_from(["tinct", "versions", "--store", "/tmp/s", "restore", "3"]);
        match args.command {
            Commands::Versions { store, action } => {
                assert_eq!(store, Some(PathBuf::from("/tmp/s")));
                assert!(matches!(action, VersionAction::Restore { version: 3 }));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_compile_writes_theme() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        std::fs::write(&base, r#"{ "name": "Base", "type": "dark", "colors": {}, "tokenColors": [] }"#).unwrap();

        compile_command(&base, "Out Theme", ThemeKind::Dark, None, dir.path()).unwrap();
        let written = ThemeDocument::load(&dir.path().join("out-theme-color-theme.json")).unwrap();
        assert_eq!(written.name, "Out Theme");
        assert_eq!(written.semantic_highlighting, Some(true));
    }

    #[test]
    fn test_compile_rejects_bad_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.json");
        std::fs::write(&base, r#"{ "name": "Base", "type": "dark" }"#).unwrap();
        assert!(compile_command(&base, "a/b", ThemeKind::Dark, None, dir.path()).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
