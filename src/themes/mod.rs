use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::ui::Theme;

pub const DEFAULT_THEME: &str = "tokyonight-storm";

/// Base16 color scheme (16 colors: base00-base0F)
#[derive(Debug, Deserialize)]
pub struct Base16Scheme {
    pub scheme: String,
    #[serde(default)]
    pub author: String,
    pub base00: String,
    pub base01: String,
    pub base02: String,
    pub base03: String,
    pub base04: String,
    pub base05: String,
    pub base06: String,
    pub base07: String,
    pub base08: String,
    pub base09: String,
    #[serde(rename = "base0A")]
    pub base0a: String,
    #[serde(rename = "base0B")]
    pub base0b: String,
    #[serde(rename = "base0C")]
    pub base0c: String,
    #[serde(rename = "base0D")]
    pub base0d: String,
    #[serde(rename = "base0E")]
    pub base0e: String,
    #[serde(rename = "base0F")]
    pub base0f: String,
}

impl Base16Scheme {
    /// Parse a hex color string (with or without #) to RGB
    fn parse_hex(hex: &str) -> Result<Color> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(anyhow!("Invalid hex color: {}", hex));
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        Ok(Color::Rgb(r, g, b))
    }

    /// Convert base16 scheme to Theme
    pub fn to_theme(&self) -> Result<Theme> {
        // base01 status bar, base02 selection, base03 muted text, base05 foreground,
        // base08 red, base09 orange, base0A yellow, base0B green, base0C cyan,
        // base0D blue, base0E purple.
        let bg_light = Self::parse_hex(&self.base01)?;
        let selection = Self::parse_hex(&self.base02)?;
        let comment = Self::parse_hex(&self.base03)?;
        let fg_dark = Self::parse_hex(&self.base04)?;
        let fg = Self::parse_hex(&self.base05)?;
        let red = Self::parse_hex(&self.base08)?;
        let orange = Self::parse_hex(&self.base09)?;
        let yellow = Self::parse_hex(&self.base0a)?;
        let green = Self::parse_hex(&self.base0b)?;
        let cyan = Self::parse_hex(&self.base0c)?;
        let blue = Self::parse_hex(&self.base0d)?;
        let purple = Self::parse_hex(&self.base0e)?;

        Ok(Theme {
            border: Style::default().fg(comment),
            border_focused: Style::default().fg(cyan),
            title: Style::default().fg(fg),
            title_focused: Style::default().fg(cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(selection).add_modifier(Modifier::BOLD),
            marked: Style::default().fg(orange).add_modifier(Modifier::BOLD),
            customer_label: Style::default().fg(green).add_modifier(Modifier::BOLD),
            customer_text: Style::default().fg(fg),
            agent_label: Style::default().fg(purple).add_modifier(Modifier::BOLD),
            agent_text: Style::default().fg(fg),
            operator: Style::default().fg(fg_dark),
            timestamp: Style::default().fg(comment),
            chip: Style::default().fg(fg),
            chip_active: Style::default().fg(cyan).add_modifier(Modifier::BOLD),
            count: Style::default().fg(comment),
            section: Style::default().fg(blue).add_modifier(Modifier::BOLD),
            field_label: Style::default().fg(fg_dark),
            field_value: Style::default().fg(fg),
            field_missing: Style::default().fg(comment).add_modifier(Modifier::ITALIC),
            editing: Style::default()
                .fg(yellow)
                .add_modifier(Modifier::UNDERLINED),
            pending: Style::default().fg(comment).add_modifier(Modifier::ITALIC),
            level_high: Style::default().fg(green),
            level_medium: Style::default().fg(yellow),
            level_low: Style::default().fg(red),
            error: Style::default().fg(red),
            success: Style::default().fg(green),
            status_bar: Style::default().bg(bg_light).fg(fg),
            key_hint: Style::default().fg(cyan),
        })
    }
}

// Bundled preset themes
const TOKYONIGHT_STORM: &str = include_str!("presets/tokyonight-storm.yaml");
const DRACULA: &str = include_str!("presets/dracula.yaml");
const NORD: &str = include_str!("presets/nord.yaml");
const GRUVBOX_DARK: &str = include_str!("presets/gruvbox-dark.yaml");

/// Get list of bundled theme names
pub fn bundled_themes() -> Vec<&'static str> {
    vec!["tokyonight-storm", "dracula", "nord", "gruvbox-dark"]
}

/// Load a bundled theme by name
fn load_bundled(name: &str) -> Option<&'static str> {
    match name {
        "tokyonight-storm" => Some(TOKYONIGHT_STORM),
        "dracula" => Some(DRACULA),
        "nord" => Some(NORD),
        "gruvbox-dark" => Some(GRUVBOX_DARK),
        _ => None,
    }
}

/// Get custom themes directory path
pub fn custom_themes_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("convo-browser").join("themes"))
}

fn parse_scheme(yaml: &str) -> Result<Theme> {
    let scheme: Base16Scheme = serde_yaml::from_str(yaml)?;
    scheme
        .to_theme()
        .with_context(|| format!("theme '{}'", scheme.scheme))
}

fn custom_theme_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .collect()
}

/// List available themes (bundled + custom)
pub fn list_themes() -> Vec<String> {
    list_themes_in(custom_themes_dir().as_deref())
}

fn list_themes_in(custom_dir: Option<&Path>) -> Vec<String> {
    let mut themes: Vec<String> = bundled_themes().into_iter().map(String::from).collect();

    if let Some(dir) = custom_dir {
        for name in custom_theme_names(dir) {
            if !themes.contains(&name) {
                themes.push(name);
            }
        }
    }

    themes.sort();
    themes
}

/// Load a theme by name (checks bundled first, then custom directory)
pub fn load_theme(name: &str) -> Result<Theme> {
    load_theme_in(name, custom_themes_dir().as_deref())
}

fn load_theme_in(name: &str, custom_dir: Option<&Path>) -> Result<Theme> {
    if let Some(yaml) = load_bundled(name) {
        return parse_scheme(yaml);
    }

    if let Some(dir) = custom_dir {
        for ext in ["yaml", "yml"] {
            let path = dir.join(format!("{}.{}", name, ext));
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                return parse_scheme(&content);
            }
        }
    }

    Err(anyhow!(
        "Theme '{}' not found. Available themes: {}",
        name,
        list_themes_in(custom_dir).join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOM: &str = r#"
scheme: "Paper"
base00: "f2eede"
base01: "e6e1cf"
base02: "d8d3c2"
base03: "a09c8c"
base04: "77736a"
base05: "2e2c28"
base06: "1f1e1b"
base07: "000000"
base08: "aa3731"
base09: "b35b00"
base0A: "cb9000"
base0B: "448c27"
base0C: "0083b2"
base0D: "325cc0"
base0E: "7a3e9d"
base0F: "8f3f71"
"#;

    #[test]
    fn bundled_themes_all_parse() {
        for name in bundled_themes() {
            assert!(load_theme_in(name, None).is_ok(), "{} failed to load", name);
        }
    }

    #[test]
    fn hex_with_or_without_hash() {
        assert_eq!(
            Base16Scheme::parse_hex("#24283b").unwrap(),
            Color::Rgb(0x24, 0x28, 0x3b)
        );
        assert_eq!(
            Base16Scheme::parse_hex("FFFFFF").unwrap(),
            Color::Rgb(255, 255, 255)
        );
        assert!(Base16Scheme::parse_hex("fff").is_err());
        assert!(Base16Scheme::parse_hex("zzzzzz").is_err());
    }

    #[test]
    fn custom_theme_is_listed_and_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("paper.yml"), CUSTOM).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let names = list_themes_in(Some(dir.path()));
        assert!(names.contains(&"paper".to_string()));
        assert!(!names.contains(&"notes".to_string()));

        let theme = load_theme_in("paper", Some(dir.path())).unwrap();
        assert_eq!(theme.error, Style::default().fg(Color::Rgb(0xaa, 0x37, 0x31)));
    }

    #[test]
    fn unknown_theme_lists_alternatives() {
        let Err(err) = load_theme_in("missing", None) else {
            panic!("unknown theme loaded");
        };
        let err = err.to_string();
        assert!(err.contains("missing"));
        assert!(err.contains("tokyonight-storm"));
    }
}
