//! Remote document-to-markdown extraction (LlamaParse-compatible API).
//!
//! The file is uploaded as a parse job, the job is polled until it finishes,
//! then the markdown result is fetched. The whole exchange is bounded by the
//! configured timeout. Any failure is reported as [`IngestError::Remote`] so the
//! caller can fall back to OCR.

use pocketbook_core::ExtractionConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::{normalize, StatementSource};
use crate::error::IngestError;

/// Instruction sent with every upload. Keeps the statement period line and
/// marks credited amounts with a trailing "CR".
pub const EXTRACTION_PROMPT: &str = "The document provided is a statement of transactions. \
Cleanly extract the relevant text and tables from the statement. \
Extract the line that includes the statement date or period. \
Extract the transactions as a table with fields including transaction date, \
posting date, description, and amount. If the amount was credited, add the \
suffix 'CR' immediately following the amount. \
Extract all other text that is relevant to the statement, account, or transactions.";

pub struct RemoteMarkdownSource {
    endpoint: String,
    api_key_env: String,
    timeout: Duration,
    poll_interval: Duration,
}

#[derive(Deserialize)]
struct JobResp {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct MarkdownResp {
    markdown: String,
}

impl RemoteMarkdownSource {
    pub fn from_config(cfg: &ExtractionConfig) -> Self {
        Self {
            endpoint: cfg.remote_endpoint.trim_end_matches('/').to_string(),
            api_key_env: cfg.remote_api_key_env.clone(),
            timeout: Duration::from_secs(cfg.remote_timeout_secs),
            poll_interval: Duration::from_secs(cfg.poll_interval_secs.max(1)),
        }
    }

    fn api_key(&self) -> Result<String, IngestError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IngestError::Remote(format!("{} is not set", self.api_key_env)))
    }

    fn convert(&self, path: &Path) -> Result<String, IngestError> {
        // Callers may already be inside a runtime (e.g. an async front end).
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.convert_with_timeout(path)))
        } else {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| IngestError::Remote(format!("create tokio runtime: {e}")))?;
            rt.block_on(self.convert_with_timeout(path))
        }
    }

    async fn convert_with_timeout(&self, path: &Path) -> Result<String, IngestError> {
        match tokio::time::timeout(self.timeout, self.convert_async(path)).await {
            Ok(res) => res,
            Err(_) => Err(IngestError::Remote(format!(
                "timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    async fn convert_async(&self, path: &Path) -> Result<String, IngestError> {
        let key = self.api_key()?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| IngestError::read(path, e))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("statement.pdf")
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| IngestError::Remote(format!("bad credential: {e}")))?,
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(remote)?;

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(remote)?;
        let form = Form::new()
            .part("file", part)
            .text("result_type", "markdown")
            .text("parsing_instruction", EXTRACTION_PROMPT)
            .text("skip_diagonal_text", "true")
            .text("do_not_unroll_columns", "true");

        let resp = client
            .post(format!("{}/upload", self.endpoint))
            .multipart(form)
            .send()
            .await
            .map_err(remote)?;
        let job: JobResp = check(resp).await?.json().await.map_err(remote)?;
        log::info!("remote extraction job {} submitted for {}", job.id, path.display());

        let mut status = job.status;
        loop {
            match status.to_ascii_uppercase().as_str() {
                "SUCCESS" => break,
                "ERROR" | "CANCELED" => {
                    return Err(IngestError::Remote(format!("job {} ended with {status}", job.id)));
                }
                _ => {}
            }
            tokio::time::sleep(self.poll_interval).await;
            let resp = client
                .get(format!("{}/job/{}", self.endpoint, job.id))
                .send()
                .await
                .map_err(remote)?;
            let polled: JobResp = check(resp).await?.json().await.map_err(remote)?;
            status = polled.status;
        }

        let resp = client
            .get(format!("{}/job/{}/result/markdown", self.endpoint, job.id))
            .send()
            .await
            .map_err(remote)?;
        let out: MarkdownResp = check(resp).await?.json().await.map_err(remote)?;
        Ok(out.markdown)
    }
}

fn remote(e: impl std::fmt::Display) -> IngestError {
    IngestError::Remote(e.to_string())
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, IngestError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let txt = resp.text().await.unwrap_or_default();
    Err(IngestError::Remote(format!("{status} {txt}")))
}

impl StatementSource for RemoteMarkdownSource {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let text = self.convert(path)?;
        if text.trim().is_empty() {
            return Err(IngestError::Remote("empty markdown result".to_string()));
        }
        normalize(path, text)
    }
}
