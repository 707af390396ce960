use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://employee-manager-1-ilvi.onrender.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ConfigFile {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "staffdesk") {
            Ok(proj_dirs.config_dir().join("config.json"))
        } else {
            Ok(PathBuf::from("staffdesk.json"))
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl Config {
    /// Flags (which clap already merged with the environment) win over the
    /// config file, which wins over the built-in defaults.
    pub fn resolve(flag_url: Option<String>, flag_token: Option<String>, file: &ConfigFile) -> Result<Self> {
        let base_url = flag_url
            .or_else(|| file.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = normalize_url(&base_url)?;

        let token = flag_token
            .or_else(|| file.token.clone())
            .filter(|t| !t.trim().is_empty());

        Ok(Self {
            base_url,
            token,
            timeout_secs: file.timeout_secs.filter(|secs| *secs > 0).unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn masked_token(&self) -> String {
        mask(self.token.as_deref())
    }
}

pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed).with_context(|| format!("Invalid API URL: {}", raw))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(anyhow!("Unsupported URL scheme '{}' in {}", other, raw)),
    }
}

pub fn mask(token: Option<&str>) -> String {
    match token {
        None => "(none)".to_string(),
        Some(t) if t.chars().count() <= 8 => "****".to_string(),
        Some(t) => {
            let tail: String = t.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::resolve(None, None, &ConfigFile::default()).unwrap();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert!(config.token.is_none());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = ConfigFile {
            api_url: Some("https://file.example.com".into()),
            token: Some("file-token".into()),
            timeout_secs: Some(5),
        };
        let config = Config::resolve(
            Some("http://localhost:5000/".into()),
            Some("flag-token".into()),
            &file,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.token.as_deref(), Some("flag-token"));
        assert_eq!(config.timeout_secs, 5);

        let config = Config::resolve(None, None, &file).unwrap();
        assert_eq!(config.base_url, "https://file.example.com");
        assert_eq!(config.token.as_deref(), Some("file-token"));
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let file = ConfigFile {
            timeout_secs: Some(0),
            ..ConfigFile::default()
        };
        let config = Config::resolve(None, None, &file).unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_blank_token_is_no_token() {
        let config = Config::resolve(None, Some("  ".into()), &ConfigFile::default()).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(normalize_url("not a url").is_err());
        assert!(normalize_url("ftp://files.example.com").is_err());
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(None), "(none)");
        assert_eq!(mask(Some("short")), "****");
        assert_eq!(mask(Some("eyJhbGciOiJIUzI1NiJ9.abcd1234")), "****1234");
    }

    #[test]
    fn test_config_file_round_trip_on_disk() {
        let dir = std::env::temp_dir().join(format!("staffdesk-config-test-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");
        assert_eq!(ConfigFile::load(&path).unwrap(), ConfigFile::default());

        let file = ConfigFile {
            api_url: Some("http://localhost:5000".into()),
            token: None,
            timeout_secs: None,
        };
        file.save(&path).unwrap();
        assert_eq!(ConfigFile::load(&path).unwrap(), file);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("token"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
