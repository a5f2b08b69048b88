pub mod accessibility;
pub mod cache;
pub mod classify;
pub mod loader;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod summary;

pub use crate::domain::model::{Region, RegionData, SummaryRow, SummaryScope};
pub use crate::domain::ports::{DataSource, Presenter};
pub use crate::utils::error::Result;
