pub mod toml_config;

use crate::core::session::SessionOptions;
use crate::domain::model::SummaryScope;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_data_root, validate_non_empty_string, validate_path, validate_positive_number,
    Validate,
};
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::core::scheduler::DEFAULT_QUIET_PERIOD;
#[cfg(feature = "cli")]
use crate::utils::error::AccessError;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::TomlConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "facility-access")]
#[command(about = "Travel time from population mesh cells to the nearest selected facility")]
pub struct CliConfig {
    /// Data root: http(s) base URL or local directory containing prefectures.json
    #[arg(long)]
    pub data_root: Option<String>,

    /// TOML configuration file; CLI arguments take precedence
    #[arg(short, long)]
    pub config: Option<String>,

    /// Summary scope: "all" or a region code (default: first region)
    #[arg(long)]
    pub scope: Option<String>,

    #[arg(long, help = "Quiet period before recomputing after a selection change")]
    pub debounce_ms: Option<u64>,

    /// Directory for summary.csv / report.json
    #[arg(long)]
    pub output_path: Option<String>,

    #[arg(long, help = "Also write one <code>.geojson per region to the output path")]
    pub geojson: bool,

    /// Facilities to deselect after startup (comma-separated names)
    #[arg(long, value_delimiter = ',')]
    pub deselect: Vec<String>,

    /// Keep only the facilities of this region active
    #[arg(long)]
    pub only_region: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

/// Settings for one run, after merging the TOML file under the CLI arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub data_root: String,
    pub debounce_ms: u64,
    pub scope: Option<SummaryScope>,
    pub output_path: Option<String>,
    pub geojson: bool,
    pub deselect: Vec<String>,
    pub only_region: Option<String>,
    pub verbose: bool,
    pub json_logs: bool,
}

impl RunConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            quiet_period: Duration::from_millis(self.debounce_ms),
            scope: self.scope.clone(),
        }
    }

    #[cfg(feature = "cli")]
    pub fn from_cli(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        Self::merge(cli, &file)
    }

    #[cfg(feature = "cli")]
    pub fn merge(cli: &CliConfig, file: &TomlConfig) -> Result<Self> {
        file.validate()?;

        let data_root = cli
            .data_root
            .clone()
            .or_else(|| file.data_root().map(str::to_string))
            .ok_or_else(|| AccessError::MissingConfigError {
                field: "data_root".to_string(),
            })?;

        let scope = cli
            .scope
            .as_deref()
            .or_else(|| file.summary_scope())
            .map(|s| s.parse::<SummaryScope>().unwrap_or_default());

        let output = file.output.as_ref();
        let logging = file.logging.as_ref();

        Ok(Self {
            data_root,
            debounce_ms: cli
                .debounce_ms
                .or_else(|| file.debounce_ms())
                .unwrap_or(DEFAULT_QUIET_PERIOD.as_millis() as u64),
            scope,
            output_path: cli
                .output_path
                .clone()
                .or_else(|| output.map(|o| o.path.clone())),
            geojson: cli.geojson || output.is_some_and(|o| o.geojson),
            deselect: cli.deselect.clone(),
            only_region: cli.only_region.clone(),
            verbose: cli.verbose || logging.and_then(|l| l.verbose).unwrap_or(false),
            json_logs: cli.json_logs || file.log_format() == Some("json"),
        })
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_data_root("data_root", &self.data_root)?;
        validate_positive_number("debounce_ms", self.debounce_ms, 1)?;
        if let Some(path) = &self.output_path {
            validate_path("output_path", path)?;
        }
        if let Some(code) = &self.only_region {
            validate_non_empty_string("only_region", code)?;
        }
        if let Some(SummaryScope::Region(code)) = &self.scope {
            validate_non_empty_string("scope", code)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = CliConfig::parse_from([
            "facility-access",
            "--data-root",
            "./data",
            "--scope",
            "02",
            "--deselect",
            "A病院,B病院",
            "--verbose",
        ]);
        assert_eq!(cli.data_root.as_deref(), Some("./data"));
        assert_eq!(cli.deselect, vec!["A病院", "B病院"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = TomlConfig::from_toml_str(
            r#"
[data]
root = "https://example.com/data"

[session]
debounce_ms = 500
summary_scope = "01"

[output]
path = "./out"
geojson = true
"#,
        )
        .unwrap();
        let cli = CliConfig {
            data_root: Some("./local".into()),
            scope: Some("all".into()),
            ..Default::default()
        };

        let run = RunConfig::merge(&cli, &file).unwrap();
        assert_eq!(run.data_root, "./local");
        assert_eq!(run.scope, Some(SummaryScope::All));
        assert_eq!(run.debounce_ms, 500);
        assert_eq!(run.output_path.as_deref(), Some("./out"));
        assert!(run.geojson);
        assert!(run.validate().is_ok());
        assert_eq!(run.session_options().quiet_period, Duration::from_millis(500));
    }

    #[test]
    fn test_defaults() {
        let cli = CliConfig {
            data_root: Some("./data".into()),
            ..Default::default()
        };
        let run = RunConfig::merge(&cli, &TomlConfig::default()).unwrap();
        assert_eq!(run.debounce_ms, 200);
        assert_eq!(run.scope, None);
        assert!(!run.json_logs);
    }

    #[test]
    fn test_missing_data_root() {
        let err = RunConfig::merge(&CliConfig::default(), &TomlConfig::default()).unwrap_err();
        assert!(matches!(err, AccessError::MissingConfigError { .. }));
    }

    #[test]
    fn test_zero_debounce_rejected() {
        let cli = CliConfig {
            data_root: Some("./data".into()),
            debounce_ms: Some(0),
            ..Default::default()
        };
        let run = RunConfig::merge(&cli, &TomlConfig::default()).unwrap();
        assert!(run.validate().is_err());
    }
}
