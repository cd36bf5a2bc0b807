use std::time::Duration;

use chrono::Utc;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, ORIGIN, REFERER};
use serde_json::Value;
use storage::models::RankingCategory;

use crate::error::Result;
use crate::traits::RankingSource;

const DEFAULT_BASE_URL: &str =
    "https://wtt-web-frontdoor-withoutcache-cqakg0andqf5hchn.a01.azurefd.net/ranking";
const SITE: &str = "https://www.worldtabletennis.com";

/// Reads the public ranking files behind worldtabletennis.com
pub struct WttClient {
    base_url: String,
    client: reqwest::Client,
}

impl WttClient {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static(SITE));
        headers.insert(REFERER, HeaderValue::from_static("https://www.worldtabletennis.com/"));

        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)")
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn category_url(&self, category: RankingCategory) -> String {
        format!("{}/{}.json", self.base_url, category.as_str())
    }
}

#[async_trait::async_trait]
impl RankingSource for WttClient {
    async fn fetch(&self, category: RankingCategory) -> Result<Value> {
        let url = self.category_url(category);
        // Cache buster, the front door serves stale files otherwise
        let stamp = Utc::now().timestamp_millis().to_string();

        tracing::debug!("Fetching {} rankings from {}", category.as_str(), url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", stamp.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let payload = response.json::<Value>().await?;
        Ok(payload)
    }
}
