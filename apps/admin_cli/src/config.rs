use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::PortalOptions;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub token: Option<String>,
    pub debounce_ms: u64,
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:4500".into(),
            token: None,
            debounce_ms: 500,
            page_size: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    token: Option<String>,
    debounce_ms: Option<u64>,
    page_size: Option<usize>,
}

impl Settings {
    pub fn portal_options(&self) -> PortalOptions {
        PortalOptions {
            debounce: Duration::from_millis(self.debounce_ms),
            page_size: self.page_size.max(1),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.backend_url)
            .with_context(|| format!("invalid backend url '{}'", self.backend_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("backend url must be http or https, got '{}'", self.backend_url);
        }
        Ok(())
    }
}

/// Defaults, then the optional TOML file, then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.token {
        settings.token = Some(v);
    }
    if let Some(v) = file_cfg.debounce_ms {
        settings.debounce_ms = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("BACKEND_URL") {
        settings.backend_url = v;
    }
    if let Some(v) = var("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = var("ADMIN_TOKEN") {
        settings.token = Some(v);
    }
    if let Some(v) = var("APP__TOKEN") {
        settings.token = Some(v);
    }

    if let Some(v) = var("APP__DEBOUNCE_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.debounce_ms = parsed,
            Err(err) => tracing::warn!(value = %v, error = %err, "ignoring APP__DEBOUNCE_MS"),
        }
    }
    if let Some(v) = var("APP__PAGE_SIZE") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.page_size = parsed,
            Err(err) => tracing::warn!(value = %v, error = %err, "ignoring APP__PAGE_SIZE"),
        }
    }
}
