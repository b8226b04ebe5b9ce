use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Default socket endpoint of the chat service.
pub const DEFAULT_SOCKET_URL: &str = "ws://localhost:4000/socket/websocket";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    pub socket_url: String,
    #[serde(default)]
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            theme: "dark".to_string(),
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(proj) = ProjectDirs::from("com", "portchat", "portchat") {
        let dir = proj.config_dir();
        if let Err(e) = fs::create_dir_all(dir) {
            tracing::warn!(error = %e, "failed to create config dir");
            return None;
        }
        return Some(dir.join("settings.json"));
    }
    None
}

pub fn load_settings() -> Option<Settings> {
    let path = settings_path()?;
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

pub fn save_settings(settings: &Settings) -> std::io::Result<()> {
    if let Some(path) = settings_path() {
        let mut file = fs::File::create(path)?;
        let data = serde_json::to_string_pretty(settings)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        file.write_all(data.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.socket_url, DEFAULT_SOCKET_URL);
        assert!(crate::validation::validate_socket_url(&settings.socket_url).is_ok());
    }

    #[test]
    fn test_settings_round_trip_json() {
        let settings = Settings {
            socket_url: "wss://chat.example.com/socket/websocket".into(),
            theme: "light".into(),
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.socket_url, settings.socket_url);
        assert_eq!(back.theme, "light");
    }

    #[test]
    fn test_theme_field_is_optional() {
        let back: Settings =
            serde_json::from_str(r#"{"socket_url":"ws://localhost:4000/socket/websocket"}"#)
                .unwrap();
        assert!(back.theme.is_empty());
    }
}
