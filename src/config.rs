use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::engine::Theme;

const APP_DIR: &str = "mermaid-view";
const LOCAL_FILE: &str = ".mermaidviewrc";

/// Flags that can be saved as defaults.
///
/// The same flags come from the global config file, the local override
/// file and the command line; [`ConfigFlags::union`] layers them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub theme: Option<Theme>,
    pub png_width: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub render_debug_log: Option<PathBuf>,
    /// Raw `name=value` passthrough attributes, in order.
    pub attrs: Vec<String>,
}

impl ConfigFlags {
    /// Layer `other` over `self`: booleans are OR'ed, valued options from
    /// `other` win, attributes accumulate with `other`'s last.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            theme: other.theme.or(self.theme),
            png_width: other.png_width.or(self.png_width),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
            attrs: self.attrs.iter().chain(&other.attrs).cloned().collect(),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

/// Load flags from a config file, one flag per line.
///
/// A line is either `--key=value` or `--key value`, where the value runs to
/// the end of the line and may contain spaces.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(line_tokens)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# mermaid-view defaults (saved with --save)".to_string());
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {}", theme.as_str()));
    }
    if let Some(width) = flags.png_width {
        lines.push(format!("--png-width {width}"));
    }
    if let Some(secs) = flags.timeout_secs {
        lines.push(format!("--timeout {secs}"));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    for attr in &flags.attrs {
        lines.push(format!("--attr {attr}"));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

fn line_tokens(line: &str) -> Vec<String> {
    match line.split_once(char::is_whitespace) {
        Some((key, value)) if !key.contains('=') => {
            vec![key.to_string(), value.trim().to_string()]
        }
        _ => vec![line.to_string()],
    }
}

/// Extract known flags from raw argument tokens, ignoring everything else.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (key, inline) = match token.split_once('=') {
            Some((key, value)) if key.starts_with("--") => (key, Some(value)),
            _ => (token, None),
        };
        if key == "--watch" || key == "-w" {
            flags.watch = true;
            i += 1;
            continue;
        }
        if !matches!(
            key,
            "--theme" | "--png-width" | "--timeout" | "--render-debug-log" | "--attr"
        ) {
            i += 1;
            continue;
        }
        let value = match inline {
            Some(value) => Some(value),
            None => {
                i += 1;
                tokens.get(i).map(String::as_str)
            }
        };
        if let Some(value) = value {
            match key {
                "--theme" => flags.theme = Theme::from_str(value, false).ok(),
                "--png-width" => flags.png_width = value.parse().ok(),
                "--timeout" => flags.timeout_secs = value.parse().ok(),
                "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
                _ => flags.attrs.push(value.to_string()),
            }
        }
        i += 1;
    }
    flags
}
