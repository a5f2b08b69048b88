// Adapters layer: concrete data sources and presenters.

pub mod http;
pub mod local;
pub mod report;

use crate::domain::ports::DataSource;
use crate::utils::error::Result;
use crate::utils::validation::is_remote_root;
use std::sync::Arc;

/// `http(s)://` roots are fetched over HTTP, anything else is a local directory.
pub fn data_source_for(root: &str) -> Result<Arc<dyn DataSource>> {
    if is_remote_root(root) {
        Ok(Arc::new(http::HttpDataSource::new(root)?))
    } else {
        Ok(Arc::new(local::LocalDataSource::new(root)))
    }
}
