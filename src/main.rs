//! mermaid-view - Render a mermaid diagram into an embeddable HTML fragment.
//!
//! # Usage
//!
//! ```bash
//! mermaid-view flow.mmd
//! mermaid-view --attr class=diagram --output flow.html flow.mmd
//! mermaid-view --watch --png flow.png flow.mmd
//! ```

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use mermaid_view::app::{App, DEFAULT_PNG_WIDTH, DEFAULT_TIMEOUT};
use mermaid_view::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use mermaid_view::engine::{EngineSettings, Theme};
use mermaid_view::view::Attributes;

/// Render a mermaid diagram into an embeddable HTML fragment
#[derive(Parser, Debug)]
#[command(name = "mermaid-view", version, about, long_about = None)]
struct Cli {
    /// Mermaid source file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Diagram id (defaults to the file name)
    #[arg(long)]
    name: Option<String>,

    /// Attribute for the output container, as NAME=VALUE (repeatable)
    #[arg(long = "attr", value_name = "NAME=VALUE")]
    attrs: Vec<String>,

    /// Diagram theme
    #[arg(long, value_enum)]
    theme: Option<Theme>,

    /// Write the fragment to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also rasterize the diagram to a PNG file
    #[arg(long, value_name = "PATH")]
    png: Option<PathBuf>,

    /// Width of the PNG in pixels
    #[arg(long, value_name = "PX")]
    png_width: Option<u32>,

    /// Watch the file for changes and re-render
    #[arg(short, long)]
    watch: bool,

    /// Seconds to wait for the first render
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Write log output to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn init_logging(log_path: Option<&PathBuf>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    if let Some(path) = log_path {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    let log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MERMAID_VIEW_LOG").map(PathBuf::from));
    init_logging(log_path.as_ref())?;

    let mut attributes = Attributes::new();
    for token in &effective.attrs {
        let (name, value) =
            Attributes::parse_pair(token).with_context(|| format!("Bad --attr {token}"))?;
        attributes.insert(name, value);
    }

    let settings = EngineSettings::default().with_theme(effective.theme.unwrap_or_default());
    let timeout = effective
        .timeout_secs
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

    let app = App::new(cli.file)
        .with_name(cli.name)
        .with_attributes(attributes)
        .with_settings(settings)
        .with_watch(effective.watch)
        .with_output(cli.output)
        .with_png(cli.png, effective.png_width.unwrap_or(DEFAULT_PNG_WIDTH))
        .with_timeout(timeout);

    app.run().context("Render failed")
}
