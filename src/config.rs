use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";
pub const DEFAULT_SAMPLE_RATE_HERTZ: u32 = 16000;
pub const DEFAULT_MAX_CHARS: usize = 20;
pub const DEFAULT_OUT_FILE: &str = "en";
pub const DEFAULT_MERGE_OUTPUT: &str = "output.srt";

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub transcribe: TranscribeConfig,
    pub merge: MergeConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TranscribeConfig {
    pub storage_uri: Option<String>,
    pub language_code: String,
    pub sample_rate_hertz: u32,
    pub out_file: String,
    pub max_chars: usize,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            storage_uri: None,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            sample_rate_hertz: DEFAULT_SAMPLE_RATE_HERTZ,
            out_file: DEFAULT_OUT_FILE.to_string(),
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    pub output: PathBuf,
    pub replace: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_MERGE_OUTPUT),
            replace: false,
        }
    }
}

pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".speech2srt"))
}

pub fn resolve_profile_path(profile: &str) -> anyhow::Result<PathBuf> {
    if let Some(rest) = profile.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not find home directory")?;
        return Ok(home.join(rest));
    }

    let path = PathBuf::from(profile);
    if path.is_absolute() || profile.starts_with("./") || profile.starts_with("../") {
        return Ok(path);
    }

    Ok(config_dir()?
        .join("profiles")
        .join(format!("{}.yaml", profile)))
}

/// Loads `~/.speech2srt/config.yaml`, or the defaults if there is none.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let config_path = config_dir()?.join("config.yaml");

    if !config_path.exists() {
        log::debug!("No config at {:?}, using defaults", config_path);
        return Ok(AppConfig::default());
    }

    load_config_file(&config_path)
}

pub fn load_config_file(path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    parse_config(&content).with_context(|| format!("Failed to parse config {:?}", path))
}

pub fn parse_config(content: &str) -> anyhow::Result<AppConfig> {
    // an empty file is a null document
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_yaml::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.transcribe.max_chars, 20);
        assert_eq!(config.transcribe.sample_rate_hertz, 16000);
        assert_eq!(config.transcribe.language_code, "en-US");
        assert_eq!(config.merge.output, PathBuf::from("output.srt"));
        assert!(!config.merge.replace);
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = parse_config(
            "transcribe:\n  language_code: zh-CN\n  max_chars: 16\nmerge:\n  replace: true\n",
        )
        .unwrap();

        assert_eq!(config.transcribe.language_code, "zh-CN");
        assert_eq!(config.transcribe.max_chars, 16);
        assert_eq!(config.transcribe.out_file, "en");
        assert!(config.merge.replace);
        assert_eq!(config.merge.output, PathBuf::from("output.srt"));
    }

    #[test]
    fn negative_budget_is_rejected_while_parsing() {
        assert!(parse_config("transcribe:\n  max_chars: -3\n").is_err());
    }

    #[test]
    fn profile_paths() {
        assert_eq!(
            resolve_profile_path("./local.yaml").unwrap(),
            PathBuf::from("./local.yaml")
        );
        assert_eq!(
            resolve_profile_path("/etc/speech2srt.yaml").unwrap(),
            PathBuf::from("/etc/speech2srt.yaml")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                resolve_profile_path("zh").unwrap(),
                home.join(".speech2srt/profiles/zh.yaml")
            );
        }
    }
}
