use std::{collections::HashMap, fs};

use client_core::{people_client::DEFAULT_WPCOM_API_URL, plugin_client::DEFAULT_WPORG_API_URL};

const SETTINGS_FILE: &str = "console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub wporg_api_url: String,
    pub wpcom_api_url: String,
    pub wpcom_token: Option<String>,
    pub local_site_id: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/people.db".into(),
            wporg_api_url: DEFAULT_WPORG_API_URL.into(),
            wpcom_api_url: DEFAULT_WPCOM_API_URL.into(),
            wpcom_token: None,
            local_site_id: None,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_settings(&mut settings, &raw);
    }

    apply_env_settings(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        tracing::warn!(file = SETTINGS_FILE, "ignoring unreadable settings file");
        return;
    };

    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(v) = file_cfg.get("wporg_api_url") {
        settings.wporg_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("wpcom_api_url") {
        settings.wpcom_api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("wpcom_token") {
        settings.wpcom_token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("local_site_id") {
        settings.local_site_id = v.parse().ok();
    }
}

fn apply_env_settings(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = var("APP__WPORG_API_URL") {
        settings.wporg_api_url = v;
    }
    if let Some(v) = var("APP__WPCOM_API_URL") {
        settings.wpcom_api_url = v;
    }
    if let Some(v) = var("APP__WPCOM_TOKEN") {
        settings.wpcom_token = Some(v);
    }

    if let Some(v) = var("APP__LOCAL_SITE_ID") {
        if let Ok(parsed) = v.parse::<i64>() {
            settings.local_site_id = Some(parsed);
        }
    }
}

/// Turns a bare file path into a `sqlite://` url. Creating the file is left to `Storage::new`.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
