//! Tracker service client.
//!
//! Implements [`QuestCatalogSource`] and [`ProgressStore`] over the
//! service's JSON API. Transport failures and 5xx responses map to
//! retryable [`StoreError`] variants; 4xx responses do not.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::dto::{ErrorBody, ProgressResponse, SaveRequest, SaveResponse};
use crate::domain::{ProgressSnapshot, RawQuestRecord, SaveReceipt, UserState};
use crate::error::{Error, Result, StoreError};
use crate::infrastructure::config::store::StoreConfig;
use crate::port::outbound::{ProgressStore, QuestCatalogSource};

const QUESTS_PATH: &str = "api/quests";
const PROGRESS_PATH: &str = "api/progress";
const RESET_PATH: &str = "api/progress/reset";
const HEALTH_PATH: &str = "api/health";

/// Longest error body quoted in a [`StoreError::Rejected`] message.
const MAX_ERROR_BODY: usize = 200;

/// HTTP client for the tracker service.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: Url,
    api_token: Option<String>,
    timeout: Duration,
}

impl HttpStore {
    /// Build a client from store settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the client cannot be
    /// built.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("questboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let mut base_url = Url::parse(&config.base_url)?;
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            api_token: config.api_token.clone(),
            timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| self.transport_error(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(rejection(status, &body).into())
    }

    fn transport_error(&self, error: &reqwest::Error) -> Error {
        if error.is_timeout() {
            let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            warn!(timeout_ms, "Tracker service request timed out");
            return StoreError::Timeout { timeout_ms }.into();
        }
        warn!(error = %error, "Tracker service unreachable");
        StoreError::Unavailable(error.to_string()).into()
    }
}

/// Map a non-success status and body to a store error.
fn rejection(status: StatusCode, body: &str) -> StoreError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized(message),
        status => StoreError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl QuestCatalogSource for HttpStore {
    async fn fetch_quests(&self) -> Result<Vec<RawQuestRecord>> {
        let url = self.endpoint(QUESTS_PATH)?;
        debug!(%url, "Fetching quest catalog");
        // Records are read as plain values so one odd record cannot fail the batch.
        let values = self
            .send(self.client.get(url))
            .await?
            .json::<Vec<Value>>()
            .await?;
        Ok(values.into_iter().map(RawQuestRecord::from).collect())
    }
}

#[async_trait]
impl ProgressStore for HttpStore {
    async fn load(&self) -> Result<UserState> {
        let url = self.endpoint(PROGRESS_PATH)?;
        let progress = self
            .send(self.client.get(url))
            .await?
            .json::<ProgressResponse>()
            .await?;
        Ok(UserState::with_completed(
            progress.level.max(1),
            progress.completed_quests,
        )?)
    }

    async fn save(&self, snapshot: &ProgressSnapshot) -> Result<SaveReceipt> {
        let url = self.endpoint(PROGRESS_PATH)?;
        let response = self
            .send(self.client.put(url).json(&SaveRequest::from(snapshot)))
            .await?
            .json::<SaveResponse>()
            .await?;
        Ok(SaveReceipt {
            revision: snapshot.revision,
            completed: response.completed_quests,
            summary: response.stats,
        })
    }

    async fn reset(&self) -> Result<()> {
        let url = self.endpoint(RESET_PATH)?;
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn health(&self) -> Result<()> {
        let url = self.endpoint(HEALTH_PATH)?;
        self.send(self.client.get(url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::config::store;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned response; the received request text is sent back.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let length = text[..head_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + length || n == 0 {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&request).into_owned());
        });

        (format!("http://{addr}"), rx)
    }

    fn client(base_url: &str, token: Option<&str>) -> HttpStore {
        let mut config = store(base_url);
        config.api_token = token.map(str::to_string);
        HttpStore::new(&config).unwrap()
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let store = client("https://example.com/tracker", None);
        assert_eq!(
            store.endpoint(PROGRESS_PATH).unwrap().as_str(),
            "https://example.com/tracker/api/progress"
        );
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            rejection(StatusCode::UNAUTHORIZED, ""),
            StoreError::Unauthorized(_)
        ));
        assert_eq!(
            rejection(StatusCode::BAD_REQUEST, r#"{"error":"bad level"}"#),
            StoreError::Rejected {
                status: 400,
                message: "bad level".into()
            }
        );
        let unavailable = rejection(StatusCode::SERVICE_UNAVAILABLE, "maintenance");
        assert!(Error::from(unavailable).is_retryable());
    }

    #[tokio::test]
    async fn fetches_catalog_records() {
        let (base, _request) = serve_once(
            "200 OK",
            r#"[{"id":"debut","name":"Debut","trader":"Prapor","map":"Customs","level_required":1,"prerequisites":"[]"}]"#,
        )
        .await;

        let records = client(&base, None).fetch_quests().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(Value::from("debut")));
    }

    #[tokio::test]
    async fn odd_record_does_not_fail_catalog_fetch() {
        let (base, _request) = serve_once(
            "200 OK",
            r#"[{"id":"debut","name":"Debut"},{"id":17,"name":null,"kappa_required":1},"junk",{"id":"late","name":"Late"}]"#,
        )
        .await;

        let records = client(&base, None).fetch_quests().await.unwrap();
        let (catalog, issues) = crate::domain::QuestCatalog::decode(records);

        assert_eq!(catalog.len(), 3);
        assert!(catalog.get(&"17".into()).unwrap().goal_relevant);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].record, 2);
    }

    #[tokio::test]
    async fn stats_only_save_answer_leaves_completed_unset() {
        let (base, _request) = serve_once(
            "200 OK",
            r#"{"stats":{"completion_rate":12.5,"total_completed":2}}"#,
        )
        .await;
        let snapshot = ProgressSnapshot {
            revision: 2,
            level: 3,
            completed: vec!["a".into(), "b".into()],
        };

        let receipt = client(&base, None).save(&snapshot).await.unwrap();

        assert_eq!(receipt.completed, None);
        assert_eq!(receipt.summary.total_completed, 2);
    }

    #[tokio::test]
    async fn save_sends_full_state_with_token() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"completed_quests":["debut","shooting-cans"],"stats":{"completion_rate":12.5,"total_completed":2}}"#,
        )
        .await;
        let snapshot = ProgressSnapshot {
            revision: 4,
            level: 8,
            completed: vec!["shooting-cans".into()],
        };

        let receipt = client(&base, Some("secret")).save(&snapshot).await.unwrap();

        assert_eq!(receipt.revision, 4);
        assert_eq!(receipt.completed.map(|ids| ids.len()), Some(2));
        assert_eq!(receipt.summary.total_completed, 2);

        let request = request.await.unwrap();
        assert!(request.starts_with("PUT /api/progress"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secret"));
        assert!(request.contains(r#""completed_quests":["shooting-cans"]"#));
    }

    #[tokio::test]
    async fn server_error_is_retryable() {
        let (base, _request) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#).await;

        let err = client(&base, None).health().await.unwrap_err();

        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn client_error_is_not_retryable() {
        let (base, _request) = serve_once("422 Unprocessable Entity", r#"{"message":"nope"}"#).await;

        let err = client(&base, None).reset().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Store(StoreError::Rejected { status: 422, .. })
        ));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}"), None).load().await.unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::Unavailable(_))));
        assert!(err.is_retryable());
    }
}
