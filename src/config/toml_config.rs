use crate::utils::error::{AccessError, Result};
use crate::utils::validation::{
    validate_data_root, validate_one_of, validate_path, validate_positive_number, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LOG_FORMATS: [&str; 2] = ["compact", "json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub output: Option<OutputConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    pub root: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub debounce_ms: Option<u64>,
    pub summary_scope: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default)]
    pub geojson: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<String>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AccessError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AccessError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_ROOT})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AccessError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn data_root(&self) -> Option<&str> {
        self.data.root.as_deref()
    }

    pub fn debounce_ms(&self) -> Option<u64> {
        self.session.debounce_ms
    }

    pub fn summary_scope(&self) -> Option<&str> {
        self.session.summary_scope.as_deref()
    }

    pub fn log_format(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.format.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(root) = self.data_root() {
            validate_data_root("data.root", root)?;
        }
        if let Some(ms) = self.debounce_ms() {
            validate_positive_number("session.debounce_ms", ms, 1)?;
        }
        if let Some(output) = &self.output {
            validate_path("output.path", &output.path)?;
        }
        if let Some(format) = self.log_format() {
            validate_one_of("logging.format", format, &LOG_FORMATS)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[data]
root = "https://example.com/access-map/data"

[session]
debounce_ms = 150
summary_scope = "01"

[output]
path = "./output"
geojson = true

[logging]
format = "json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.data_root(), Some("https://example.com/access-map/data"));
        assert_eq!(config.debounce_ms(), Some(150));
        assert_eq!(config.summary_scope(), Some("01"));
        assert!(config.output.as_ref().unwrap().geojson);
        assert_eq!(config.log_format(), Some("json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.data_root().is_none());
        assert!(config.output.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FACILITY_ACCESS_TEST_ROOT", "/srv/access/data");

        let toml_content = r#"
[data]
root = "${FACILITY_ACCESS_TEST_ROOT}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.data_root(), Some("/srv/access/data"));

        std::env::remove_var("FACILITY_ACCESS_TEST_ROOT");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str("[session]\ndebounce_ms = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[logging]\nformat = \"xml\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str("[data]\nroot = \"https://\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TomlConfig::from_toml_str("[session\n").unwrap_err();
        assert!(matches!(err, AccessError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[data]\nroot = \"./data\"\n[session]\nsummary_scope = \"all\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data_root(), Some("./data"));
        assert_eq!(config.summary_scope(), Some("all"));
    }
}
