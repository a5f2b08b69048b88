use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} while fetching {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown region code: {code}")]
    UnknownRegionError { code: String },

    #[error("Failed to load region {region}: {message}")]
    LoadError { region: String, message: String },

    #[error("Failed to render region {region}: {message}")]
    RenderError { region: String, message: String },
}

impl AccessError {
    pub fn user_friendly_message(&self) -> String {
        match self {
            AccessError::ApiError(_) | AccessError::HttpStatusError { .. } => {
                "無法取得資料，請確認資料來源是否可連線".to_string()
            }
            AccessError::IoError(_) => "讀寫檔案時發生錯誤".to_string(),
            AccessError::SerializationError(_) => "資料格式無法解析".to_string(),
            AccessError::CsvError(_) => "輸出集計表時發生錯誤".to_string(),
            AccessError::ConfigError { .. }
            | AccessError::InvalidConfigValueError { .. }
            | AccessError::MissingConfigError { .. } => format!("設定錯誤: {}", self),
            AccessError::UnknownRegionError { code } => format!("找不到地區代碼 {}", code),
            AccessError::LoadError { region, .. } => format!("地區 {} 的資料載入失敗", region),
            AccessError::RenderError { region, .. } => format!("地區 {} 描繪失敗", region),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AccessError::ApiError(_) | AccessError::HttpStatusError { .. } => {
                "Check --data-root and that prefectures.json / facilities.json are reachable"
            }
            AccessError::IoError(_) => "Check that the data directory and output path exist and are writable",
            AccessError::SerializationError(_) => "Verify the JSON / GeoJSON files are well-formed",
            AccessError::CsvError(_) => "Check the output path",
            AccessError::ConfigError { .. }
            | AccessError::InvalidConfigValueError { .. }
            | AccessError::MissingConfigError { .. } => "Fix the configuration file or CLI arguments",
            AccessError::UnknownRegionError { .. } => "Use 'all' or a code listed in prefectures.json",
            AccessError::LoadError { .. } | AccessError::RenderError { .. } => {
                "The region is skipped for this session; restart to retry"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
