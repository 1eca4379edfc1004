use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub store: StoreConfig,
  /// Custom title for the header (defaults to the hospital name)
  pub title: Option<String>,
  #[serde(default)]
  pub admin: AdminConfig,
  #[serde(default)]
  pub suggestion: SuggestionConfig,
  /// Departments offered by the intake form
  #[serde(default = "default_departments")]
  pub departments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Script endpoint that backs the record store
  pub url: String,
  /// Seconds between full refresh cycles
  #[serde(default = "default_refresh_interval")]
  pub refresh_interval_secs: u64,
  /// Keep a local SQLite snapshot of the record list for offline starts
  #[serde(default = "default_true")]
  pub snapshot: bool,
}

/// Fixed credential pair for the admin console.
///
/// The defaults mirror the original deployment's hardcoded check; real
/// deployments override them in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
  #[serde(default = "default_admin_username")]
  pub username: String,
  #[serde(default = "default_admin_password")]
  pub password: String,
}

impl Default for AdminConfig {
  fn default() -> Self {
    Self {
      username: default_admin_username(),
      password: default_admin_password(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionConfig {
  /// Model name for the reply-suggestion endpoint
  #[serde(default = "default_suggestion_model")]
  pub model: String,
}

impl Default for SuggestionConfig {
  fn default() -> Self {
    Self {
      model: default_suggestion_model(),
    }
  }
}

fn default_refresh_interval() -> u64 {
  120
}

fn default_true() -> bool {
  true
}

fn default_admin_username() -> String {
  "admin".to_string()
}

fn default_admin_password() -> String {
  "admin123".to_string()
}

fn default_suggestion_model() -> String {
  "gemini-3-flash-preview".to_string()
}

fn default_departments() -> Vec<String> {
  [
    "Khoa Yêu cầu",
    "Khoa Khám bệnh",
    "Khoa Cấp cứu",
    "Khoa Nội",
    "Khoa Ngoại",
    "Khoa Sản",
    "Khoa Nhi",
    "Khoa Hồi sức tích cực",
    "Khoa Xét nghiệm",
    "Khoa Chẩn đoán hình ảnh",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./gopy.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/gopy/config.yaml
  /// 4. ~/.config/gopy/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/gopy/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("gopy.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("gopy").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  /// The store endpoint as a validated URL.
  pub fn store_url(&self) -> Result<Url> {
    Url::parse(&self.store.url).map_err(|e| eyre!("Invalid store URL {}: {}", self.store.url, e))
  }

  /// Get the suggestion API key from environment variables.
  ///
  /// Checks GOPY_GEMINI_KEY first, then GEMINI_API_KEY as fallback.
  pub fn get_suggestion_key() -> Result<String> {
    std::env::var("GOPY_GEMINI_KEY")
      .or_else(|_| std::env::var("GEMINI_API_KEY"))
      .map_err(|_| {
        eyre!(
          "Suggestion API key not found. Set GOPY_GEMINI_KEY or GEMINI_API_KEY environment variable."
        )
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_defaults() {
    let config =
      Config::parse("store:\n  url: https://script.example.com/macros/s/abc/exec\n").unwrap();

    assert_eq!(config.store.refresh_interval_secs, 120);
    assert!(config.store.snapshot);
    assert_eq!(config.admin.username, "admin");
    assert_eq!(config.admin.password, "admin123");
    assert_eq!(config.suggestion.model, "gemini-3-flash-preview");
    assert_eq!(config.departments.len(), 10);
    assert!(config.departments.contains(&"Khoa Nội".to_string()));
  }

  #[test]
  fn test_overrides_respected() {
    let yaml = "\
store:
  url: https://script.example.com/exec
  refresh_interval_secs: 30
  snapshot: false
admin:
  username: qa
  password: secret
departments:
  - Khoa Nội
";
    let config = Config::parse(yaml).unwrap();

    assert_eq!(config.store.refresh_interval_secs, 30);
    assert!(!config.store.snapshot);
    assert_eq!(config.admin.username, "qa");
    assert_eq!(config.admin.password, "secret");
    assert_eq!(config.departments, vec!["Khoa Nội".to_string()]);
  }

  #[test]
  fn test_store_url_validation() {
    let config = Config::parse("store:\n  url: not a url\n").unwrap();
    assert!(config.store_url().is_err());

    let config = Config::parse("store:\n  url: https://script.example.com/exec\n").unwrap();
    assert!(config.store_url().is_ok());
  }

  #[test]
  fn test_missing_store_url_is_an_error() {
    assert!(Config::parse("title: Hospital\n").is_err());
  }
}
