//! Remote submission of finished questionnaires.
//!
//! The [`Submitter`] trait decouples the flow from the HTTP backend. Tests use
//! scripted submitters that record what they receive without any network.

use std::env;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;
use tracing::{debug, info, instrument, warn};

use crate::core::record::ClientRecord;
use crate::io::config::SubmitConfig;

/// Abstraction over submission backends.
pub trait Submitter {
    /// Insert one client record. Any error counts as a failed submission.
    fn submit(&self, record: &ClientRecord) -> Result<()>;
}

/// PostgREST-style insert: `POST {endpoint}/rest/v1/{table}`.
#[derive(Debug, Clone)]
pub struct RestSubmitter {
    client: Client,
    url: String,
    api_key: String,
}

impl RestSubmitter {
    /// The request waits for the backend to answer; there is no timeout.
    pub fn new(endpoint: &str, table: &str, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(None)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            url: insert_url(endpoint, table),
            api_key,
        })
    }

    /// Build from config, reading the API key from `api_key_env`.
    pub fn from_config(cfg: &SubmitConfig) -> Result<Self> {
        let endpoint = cfg
            .endpoint
            .as_deref()
            .context("submit.endpoint is not configured")?;
        let api_key = env::var(&cfg.api_key_env)
            .with_context(|| format!("read API key from ${}", cfg.api_key_env))?;
        Self::new(endpoint, &cfg.table, api_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Submitter for RestSubmitter {
    #[instrument(skip_all, fields(url = %self.url, columns = record.len()))]
    fn submit(&self, record: &ClientRecord) -> Result<()> {
        debug!("posting client record");
        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .with_context(|| format!("POST {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = %status, "submission rejected");
            return Err(anyhow!("submission failed with status {}: {}", status, body));
        }
        info!(status = %status, "submission accepted");
        Ok(())
    }
}

/// Resolves the REST backend from config on each submission.
///
/// A missing endpoint or API key only surfaces when the client submits, as a
/// failed submission, so a session can be filled and resumed offline.
#[derive(Debug, Clone)]
pub struct ConfiguredSubmitter {
    config: SubmitConfig,
}

impl ConfiguredSubmitter {
    pub fn new(config: SubmitConfig) -> Self {
        Self { config }
    }

    /// Whether the backend can be resolved right now.
    pub fn check(&self) -> Result<()> {
        RestSubmitter::from_config(&self.config).map(|_| ())
    }
}

impl Submitter for ConfiguredSubmitter {
    fn submit(&self, record: &ClientRecord) -> Result<()> {
        let submitter = RestSubmitter::from_config(&self.config).inspect_err(|err| {
            warn!(error = %format!("{err:#}"), "submission backend not configured");
        })?;
        submitter.submit(record)
    }
}

fn insert_url(endpoint: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", endpoint.trim_end_matches('/'), table)
}
