use crate::paths::AppPaths;
use crate::{Result, StudioError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_KIE_DURATION_SECS: u32 = 6;

/// Options forwarded verbatim with every server-side generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub use_ai_voice: bool,
    pub voice: String,
    pub enhance_audio: bool,
    pub use_ai_background: bool,
    pub image_provider: String,
    pub use_ai_video: bool,
    pub video_provider: String,
    pub enhance_locally: bool,
    pub ken_burns: bool,
    pub vignette: bool,
    pub film_grain: bool,
    pub custom_prompt: String,
    pub prompt_provider: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            use_ai_voice: true,
            voice: "ar-SA-HamedNeural".to_string(),
            enhance_audio: true,
            use_ai_background: false,
            image_provider: "openai".to_string(),
            use_ai_video: false,
            video_provider: "local".to_string(),
            enhance_locally: true,
            ken_burns: true,
            vignette: true,
            film_grain: false,
            custom_prompt: String::new(),
            prompt_provider: "local".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub server_url: String,
    pub search_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub kie_duration_secs: u32,
    /// Background style sent as `video_type`; `None` lets the server pick.
    pub video_type: Option<String>,
    pub options: GenerationOptions,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            search_timeout_secs: DEFAULT_SEARCH_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            kie_duration_secs: DEFAULT_KIE_DURATION_SECS,
            video_type: None,
            options: GenerationOptions::default(),
        }
    }
}

pub fn load_config(paths: &AppPaths) -> Result<StudioConfig> {
    let path = paths.config_path();
    if !path.exists() {
        return Ok(StudioConfig::default());
    }
    let bytes = std::fs::read(&path)?;
    let parsed: StudioConfig = serde_json::from_slice(&bytes).map_err(|e| {
        StudioError::Validation(format!(
            "failed to parse studio config at {}: {e}",
            path.to_string_lossy()
        ))
    })?;
    Ok(parsed)
}

pub fn save_config(paths: &AppPaths, config: &StudioConfig) -> Result<()> {
    let path = paths.config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        let config = load_config(&paths).expect("load");
        assert_eq!(config, StudioConfig::default());
        assert_eq!(config.poll_interval_ms, 2000);
        assert_eq!(config.search_timeout_secs, 30);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        std::fs::create_dir_all(paths.config_dir()).expect("config dir");
        std::fs::write(
            paths.config_path(),
            r#"{"server_url":"http://studio.local:8080","options":{"film_grain":true}}"#,
        )
        .expect("write");

        let config = load_config(&paths).expect("load");
        assert_eq!(config.server_url, "http://studio.local:8080");
        assert!(config.options.film_grain);
        assert_eq!(config.options.voice, "ar-SA-HamedNeural");
        assert_eq!(config.kie_duration_secs, DEFAULT_KIE_DURATION_SECS);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        std::fs::create_dir_all(paths.config_dir()).expect("config dir");
        std::fs::write(paths.config_path(), "{not json").expect("write");
        assert!(load_config(&paths).is_err());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        let mut config = StudioConfig::default();
        config.video_type = Some("nature calm".to_string());
        config.poll_interval_ms = 500;
        save_config(&paths, &config).expect("save");
        assert_eq!(load_config(&paths).expect("load"), config);
    }
}
