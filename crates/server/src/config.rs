use std::fs;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
}

/// Defaults, then `tracker.toml`, then environment overrides.
/// `PORT` carries just a port number; the other variables a full
/// socket address.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("tracker.toml") {
        apply_file_settings(&mut settings, &raw);
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("PORT") {
        if let Ok(port) = v.parse::<u16>() {
            settings.bind_addr = bind_addr_for_port(port);
        }
    }

    settings
}

fn apply_file_settings(settings: &mut Settings, raw: &str) {
    match toml::from_str::<FileSettings>(raw) {
        Ok(file) => {
            if let Some(v) = file.bind_addr {
                settings.bind_addr = v;
            }
        }
        Err(error) => warn!(%error, "ignoring unreadable tracker.toml"),
    }
}

fn bind_addr_for_port(port: u16) -> String {
    format!("0.0.0.0:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_the_documented_port() {
        assert_eq!(Settings::default().bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn file_bind_addr_overrides_the_default() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "bind_addr = \"127.0.0.1:9090\"\n");
        assert_eq!(settings.bind_addr, "127.0.0.1:9090");
    }

    #[test]
    fn unreadable_file_leaves_the_default() {
        let mut settings = Settings::default();
        apply_file_settings(&mut settings, "bind_addr = [not toml");
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn port_override_expands_to_a_bind_address() {
        assert_eq!(bind_addr_for_port(9000), "0.0.0.0:9000");
    }
}
