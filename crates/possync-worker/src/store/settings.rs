//! JSON integration settings file.

use std::path::PathBuf;

use async_trait::async_trait;

use possync_core::error::AppError;
use possync_core::result::AppResult;
use possync_entity::IntegrationSettings;

use super::{read_optional, SettingsProvider};

/// Re-reads the settings file on every call.
#[derive(Debug, Clone)]
pub struct FileSettingsProvider {
    /// Path of the settings file.
    path: PathBuf,
}

impl FileSettingsProvider {
    /// Create a provider for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsProvider for FileSettingsProvider {
    async fn load(&self) -> AppResult<IntegrationSettings> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(IntegrationSettings::default());
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(IntegrationSettings::default());
        }

        let value: serde_json::Value = serde_json::from_slice(&content)?;
        IntegrationSettings::from_value(value).map_err(|e| {
            AppError::validation(format!(
                "Invalid integration settings '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reread_on_every_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let provider = FileSettingsProvider::new(&path);

        assert!(provider.load().await.unwrap().is_empty());

        std::fs::write(&path, r#"{"onec": {"enabled": true}}"#).unwrap();
        assert!(provider.load().await.unwrap().is_enabled("onec"));

        std::fs::write(&path, r#"{"onec": {"enabled": false}}"#).unwrap();
        assert!(!provider.load().await.unwrap().is_enabled("onec"));
    }

    #[tokio::test]
    async fn test_corrupt_settings_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{\"onec\": ").unwrap();
        assert!(FileSettingsProvider::new(&path).load().await.is_err());
    }
}
