use std::{fs, path::Path};

use serde::Deserialize;

pub const SETTINGS_FILE: &str = "billed.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub storage_path: String,
    pub proof_modal_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5678/".into(),
            storage_path: "./billed-storage.json".into(),
            proof_modal_width: 800,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    storage_path: Option<String>,
    proof_modal_width: Option<u32>,
}

pub fn load_settings() -> Settings {
    let mut settings = load_settings_from(Path::new(SETTINGS_FILE));
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn load_settings_from(path: &Path) -> Settings {
    let mut settings = Settings::default();

    let Ok(raw) = fs::read_to_string(path) else {
        return settings;
    };
    let file_cfg = match toml::from_str::<FileSettings>(&raw) {
        Ok(file_cfg) => file_cfg,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring malformed settings file");
            return settings;
        }
    };

    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.storage_path {
        settings.storage_path = v;
    }
    if let Some(v) = file_cfg.proof_modal_width {
        settings.proof_modal_width = v;
    }
    settings
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__STORAGE_PATH") {
        settings.storage_path = v;
    }
    if let Some(v) = var("APP__PROOF_MODAL_WIDTH") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.proof_modal_width = parsed;
        }
    }
}
