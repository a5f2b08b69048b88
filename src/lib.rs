pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::RunConfig;

pub use adapters::{data_source_for, http::HttpDataSource, local::LocalDataSource, report::ReportPresenter};
pub use core::session::{Session, SessionOptions};
pub use domain::model::{SummaryRow, SummaryScope};
pub use utils::error::{AccessError, Result};
