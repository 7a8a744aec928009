//! Flat `config.json` loading and credential/device resolution.

pub mod paths;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use paths::get_data_dir;

/// The on-disk shape: a flat document, every field optional. Device
/// fields are `"<index>: <name>"` strings resolved against the live
/// device list at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslatorSettings {
    #[serde(default)]
    pub api_key_groq: Option<String>,
    #[serde(default)]
    pub api_key_elevenlabs: Option<String>,
    #[serde(default)]
    pub sender_input: Option<String>,
    #[serde(default)]
    pub sender_output: Option<String>,
    #[serde(default)]
    pub receiver_input: Option<String>,
    #[serde(default)]
    pub receiver_output: Option<String>,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

impl TranslatorSettings {
    /// `api_key_groq`, falling back to `GROQ_API_KEY`.
    pub fn groq_api_key(&self) -> Option<String> {
        self.api_key_groq
            .clone()
            .or_else(|| std::env::var("GROQ_API_KEY").ok())
    }

    /// `api_key_elevenlabs`, falling back to `ELEVENLABS_API_KEY`.
    pub fn elevenlabs_api_key(&self) -> Option<String> {
        self.api_key_elevenlabs
            .clone()
            .or_else(|| std::env::var("ELEVENLABS_API_KEY").ok())
    }
}

/// Path to `config.json` in the data directory.
pub fn config_path() -> PathBuf {
    get_data_dir().join("config.json")
}

/// Read `config.json`. A missing file yields defaults; a malformed one
/// logs a warning and also yields defaults — neither is fatal, since every
/// field has a sensible fallback.
pub fn read_config() -> TranslatorSettings {
    read_json_file(&config_path()).unwrap_or_default()
}

/// Generic helper: read a JSON file and deserialize it.
fn read_json_file<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Option<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(val) => Some(val),
            Err(e) => {
                warn!("failed to parse {}: {}", path.display(), e);
                None
            }
        },
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to read {}: {}", path.display(), e);
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_none() {
        let settings: TranslatorSettings = serde_json::from_str("{}").unwrap();
        assert!(settings.api_key_groq.is_none());
        assert!(settings.sender_input.is_none());
    }

    #[test]
    fn parses_full_document() {
        let json = r#"{
            "api_key_groq": "gsk_x",
            "api_key_elevenlabs": "el_y",
            "sender_input": "1: Built-in Mic",
            "sender_output": "2: Speakers",
            "receiver_input": "3: Virtual Cable In",
            "receiver_output": "4: Virtual Cable Out",
            "source_lang": "English",
            "target_lang": "Urdu"
        }"#;
        let settings: TranslatorSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.source_lang.as_deref(), Some("English"));
        assert_eq!(settings.sender_input.as_deref(), Some("1: Built-in Mic"));
    }
}
