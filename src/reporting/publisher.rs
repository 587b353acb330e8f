use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use crate::config::{PublishConfig, StorageBackend};
use crate::errors::{with_retry, FixcheckError, RetryConfig};
use super::formatter::format_report;

/// `{agent}_results/{YYYY}/{MM}/{DD}/{repo}_{YYYYMMDDTHHMMSSZ}.md`, all from one timestamp.
pub fn object_key(agent_type: &str, repo_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_results/{}/{}_{}.md",
        agent_type,
        at.format("%Y/%m/%d"),
        repo_name,
        at.format("%Y%m%dT%H%M%SZ")
    )
}

/// Durable destination for published reports.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` under `key` and return a URL identifying the stored object.
    async fn put(&self, key: &str, body: &str, content_type: &str) -> Result<String, FixcheckError>;
}

/// Writes objects as files below a directory.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, body: &str, _content_type: &str) -> Result<String, FixcheckError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await
                .map_err(|e| FixcheckError::Storage(format!("Cannot create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, body).await
            .map_err(|e| FixcheckError::Storage(format!("Cannot write {}: {}", path.display(), e)))?;

        let absolute = std::fs::canonicalize(&path).unwrap_or(path);
        Ok(format!("file://{}", absolute.display()))
    }
}

/// PUTs objects to `{endpoint}/{bucket}/{key}`.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, bucket: &str, token: Option<String>, timeout: Duration) -> Result<Self, FixcheckError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FixcheckError::Config(format!("Cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            token,
        })
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, body: &str, content_type: &str) -> Result<String, FixcheckError> {
        let url = self.url_for(key);
        let mut request = self.client
            .put(&url)
            .header("content-type", content_type)
            .body(body.to_string());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if status.is_server_error() || status == 429 {
            return Err(FixcheckError::Network(format!("{} returned {}", url, status)));
        }
        if !status.is_success() {
            return Err(FixcheckError::Config(format!("{} rejected upload: {}", url, status)));
        }
        Ok(url)
    }
}

/// Construct the store selected in configuration.
pub fn build_store(config: &PublishConfig) -> Result<Box<dyn ObjectStore>, FixcheckError> {
    match config.backend {
        StorageBackend::Local => Ok(Box::new(LocalObjectStore::new(&config.directory))),
        StorageBackend::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                FixcheckError::Config("publish.endpoint is required for the http backend".into())
            })?;
            let token = config.token_env.as_deref().and_then(|var| std::env::var(var).ok());
            Ok(Box::new(HttpObjectStore::new(
                endpoint,
                &config.bucket,
                token,
                Duration::from_secs(config.timeout_secs),
            )?))
        }
    }
}

/// Format and upload the evidence for `repo_name`.
///
/// Never fails: the returned text is either the object URL or `upload failed: ...`.
pub async fn publish_report(
    store: &dyn ObjectStore,
    config: &PublishConfig,
    repo_name: &str,
    evidence: &str,
) -> String {
    let now = Utc::now();
    let key = object_key(&config.agent_type, repo_name, now);
    let document = format_report(&config.agent_type, repo_name, evidence, now);
    let retry = RetryConfig::from(config);

    let result = with_retry("publish_report", &retry, || {
        store.put(&key, &document, "text/markdown")
    }).await;

    match result {
        Ok(url) => {
            info!(url = %url, "Results published");
            url
        }
        Err(e) => {
            warn!(key = %key, error = %e, "Publishing failed");
            format!("upload failed: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_object_key_pattern() {
        let at = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 58).unwrap();
        assert_eq!(
            object_key("code_interpreter", "shop", at),
            "code_interpreter_results/2026/01/09/shop_20260109T235958Z.md"
        );
    }

    struct Rejecting {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl ObjectStore for Rejecting {
        async fn put(&self, _key: &str, _body: &str, _ct: &str) -> Result<String, FixcheckError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(FixcheckError::Storage("403 Forbidden".into()))
        }
    }

    #[tokio::test]
    async fn test_upload_failure_is_reported() {
        let store = Rejecting { attempts: AtomicU32::new(0) };
        let mut config = PublishConfig::default();
        config.max_retries = 0;
        let text = publish_report(&store, &config, "shop", "evidence").await;
        assert!(text.starts_with("upload failed:"));
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_local_store_writes_under_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let url = store.put("a/b/report.md", "# hi\n", "text/markdown").await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("a/b/report.md"));
        assert_eq!(std::fs::read_to_string(dir.path().join("a/b/report.md")).unwrap(), "# hi\n");
    }

    #[test]
    fn test_http_store_requires_endpoint() {
        let mut config = PublishConfig::default();
        config.backend = StorageBackend::Http;
        assert!(matches!(build_store(&config), Err(FixcheckError::Config(_))));

        config.endpoint = Some("https://storage.example.com/".into());
        let store = HttpObjectStore::new(
            config.endpoint.as_deref().unwrap(),
            &config.bucket,
            None,
            Duration::from_secs(5),
        ).unwrap();
        assert_eq!(
            store.url_for("k/x.md"),
            "https://storage.example.com/security-agent-results/k/x.md"
        );
    }
}
