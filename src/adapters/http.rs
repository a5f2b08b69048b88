use crate::domain::ports::DataSource;
use crate::utils::error::{AccessError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpDataSource {
    base: Url,
    client: Client,
}

impl HttpDataSource {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        // 確保以 / 結尾，否則 join 會取代最後一段路徑
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized).map_err(|e| AccessError::InvalidConfigValueError {
            field: "data_root".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;
        Ok(Self { base, client })
    }

    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| AccessError::InvalidConfigValueError {
                field: "path".to_string(),
                value: path.to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.url_for(path)?;
        tracing::debug!("Making request to: {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccessError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_url_for_keeps_base_path() {
        let source = HttpDataSource::new("https://example.com/app/data").unwrap();
        assert_eq!(
            source.url_for("hokkaido/mesh.geojson").unwrap().as_str(),
            "https://example.com/app/data/hokkaido/mesh.geojson"
        );
        assert_eq!(
            source.url_for("/prefectures.json").unwrap().as_str(),
            "https://example.com/app/data/prefectures.json"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpDataSource::new("not a url"),
            Err(AccessError::InvalidConfigValueError { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/data/prefectures.json");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"code": "01", "name": "北海道", "dir_name": "hokkaido"}]));
        });

        let source = HttpDataSource::new(&server.url("/data")).unwrap();
        let bytes = source.fetch("prefectures.json").await.unwrap();

        api_mock.assert();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value[0]["code"], "01");
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/aomori/mesh.geojson");
            then.status(404);
        });

        let source = HttpDataSource::new(&server.base_url()).unwrap();
        let err = source.fetch("aomori/mesh.geojson").await.unwrap_err();

        api_mock.assert();
        match err {
            AccessError::HttpStatusError { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/aomori/mesh.geojson"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
