//! HTTP access to the e-Stat API

use std::path::{Path, PathBuf};

use log::debug;

use crate::config::{EStatConfig, Lang};
use crate::prelude::*;

/// Thin wrapper over `reqwest` bound to one base URL and label language
#[derive(Debug, Clone)]
pub struct StatsClient {
    http: reqwest::Client,
    base_url: String,
    lang: Lang,
    dump_dir: Option<PathBuf>,
}

impl StatsClient {
    pub fn new(config: &EStatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(EStatConfig::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            lang: config.lang,
            dump_dir: config.dump_dir.clone(),
        })
    }

    /// Directory receiving bodies this client could not decode
    pub fn dump_dir(&self) -> Option<&Path> {
        self.dump_dir.as_deref()
    }

    pub fn url(&self, endpoint: &str) -> String {
        f!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// GET `endpoint` with `params` (plus `lang`) and return the body text
    ///
    /// Non-success statuses are errors; nothing is retried.
    pub async fn get_text(&self, endpoint: &str, params: &[(&str, String)]) -> Result<String> {
        let url = self.url(endpoint);
        debug!(
            "GET {} {:?}",
            url,
            params
                .iter()
                .filter(|(key, _)| *key != "appId")
                .collect::<Vec<_>>()
        );

        let response = self
            .http
            .get(&url)
            .query(&[("lang", self.lang.as_param())])
            .query(params)
            .send()
            .await
            .map_err(|e| Error::Network(f!("Failed to send request to {}: {}", endpoint, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| eyre!("Failed to read response from {}: {}", endpoint, e))
    }
}
