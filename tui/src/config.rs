use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quicknotes_core::storage::DEFAULT_STORAGE_KEY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Keymap {
    pub quit: String,
    pub toggle_favorite: String,
    pub delete: String,
    pub switch_focus: String,
}

impl Default for Keymap {
    fn default() -> Self {
        Self {
            quit: "q".to_string(),
            toggle_favorite: "f".to_string(),
            delete: "d".to_string(),
            switch_focus: "tab".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub storage_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    pub toast_duration_ms: u64,
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            toast_duration_ms: 3500,
            tick_rate_ms: 250,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ui: UiConfig,
    pub keymap: Keymap,
}

/// Load the config file, writing the defaults out on first run
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        let config = Config::default();
        let toml = toml::to_string(&config)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, toml)
            .with_context(|| format!("Failed to write default config to {}", path.display()))?;
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Match a binding such as `"f"`, `"ctrl-d"` or `"tab"` against a key press.
///
/// Shift is ignored for character keys since it is already part of the character.
pub fn binding_matches(binding: &str, key: &KeyEvent) -> bool {
    let mut parts: Vec<&str> = binding.split('-').collect();
    let Some(code_part) = parts.pop() else {
        return false;
    };

    let mut wanted = KeyModifiers::NONE;
    for part in parts {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" => wanted |= KeyModifiers::CONTROL,
            "alt" => wanted |= KeyModifiers::ALT,
            "shift" => wanted |= KeyModifiers::SHIFT,
            _ => return false,
        }
    }

    let code = match code_part.to_ascii_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "space" => KeyCode::Char(' '),
        _ => {
            let mut chars = code_part.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return false,
            }
        }
    };

    let mut pressed = key.modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
    if matches!(code, KeyCode::Char(_)) {
        pressed.remove(KeyModifiers::SHIFT);
        wanted.remove(KeyModifiers::SHIFT);
    }
    key.code == code && pressed == wanted
}
