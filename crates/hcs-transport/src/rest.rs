use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hcs_crypto::PublicKey;
use hcs_types::{AccountId, ConsensusTimestamp, TopicId, TopicInfo, TopicMessage};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TransportError, TransportResult};
use crate::traits::{MessageQuery, ReadTransport, TransportKind};

/// Settings for the mirror node REST client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestConfig {
    /// Root of the mirror node, e.g. `https://testnet.mirrornode.hedera.com`.
    /// A path such as `https://host/mirror` is kept as a prefix of every request.
    pub base_url: String,
    /// Messages requested per page.
    pub page_size: usize,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://testnet.mirrornode.hedera.com".into(),
            page_size: 25,
            request_timeout_ms: 30_000,
        }
    }
}

/// Reads from a mirror node's REST API.
///
/// Message pages are fetched one after another by following `links.next`.
pub struct RestTransport {
    client: Client,
    base_url: Url,
    page_size: usize,
}

impl RestTransport {
    pub fn new(config: &RestConfig) -> TransportResult<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(config.base_url.clone()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            base_url,
            page_size: config.page_size.max(1),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` under the base URL. Root-relative paths, including
    /// mirror `links.next` values, are taken relative to the base path.
    fn join(&self, path: &str) -> TransportResult<Url> {
        let relative = path
            .strip_prefix(self.base_url.path())
            .unwrap_or_else(|| path.trim_start_matches('/'));
        self.base_url
            .join(relative)
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }

    fn messages_url(&self, topic_id: &TopicId, query: &MessageQuery) -> TransportResult<Url> {
        let mut url = self.join(&format!("/api/v1/topics/{topic_id}/messages"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("limit", &self.page_size.to_string())
                .append_pair("encoding", "base64")
                .append_pair("order", "asc");
            if let Some(start) = query.start {
                pairs.append_pair("timestamp", &format!("gte:{start}"));
            }
            if let Some(end) = query.end {
                pairs.append_pair("timestamp", &format!("lte:{end}"));
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, topic_id: &TopicId) -> TransportResult<T> {
        debug!(url = %url, "mirror request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound(*topic_id));
        }
        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown status").to_string(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

impl std::fmt::Debug for RestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTransport")
            .field("base_url", &self.base_url.as_str())
            .field("page_size", &self.page_size)
            .finish()
    }
}

// ---- Mirror node wire format ----

#[derive(Debug, Deserialize)]
struct MirrorKey {
    #[serde(rename = "_type")]
    key_type: String,
    key: String,
}

impl MirrorKey {
    /// ed25519 keys are rewritten to the canonical DER form; other key types
    /// are kept as reported.
    fn canonical(self) -> String {
        if self.key_type.eq_ignore_ascii_case("ED25519") {
            if let Ok(canonical) = PublicKey::canonicalize_raw_hex(&self.key) {
                return canonical;
            }
        }
        self.key
    }
}

#[derive(Debug, Deserialize)]
struct MirrorTopic {
    topic_id: String,
    #[serde(default)]
    memo: String,
    admin_key: Option<MirrorKey>,
    submit_key: Option<MirrorKey>,
    auto_renew_period: Option<u64>,
    auto_renew_account: Option<String>,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct MirrorMessage {
    consensus_timestamp: String,
    message: String,
    #[serde(default)]
    sequence_number: u64,
}

#[derive(Debug, Default, Deserialize)]
struct MirrorLinks {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MirrorMessagePage {
    #[serde(default)]
    messages: Vec<MirrorMessage>,
    #[serde(default)]
    links: MirrorLinks,
}

fn malformed(what: &str, e: impl std::fmt::Display) -> TransportError {
    TransportError::Malformed(format!("{what}: {e}"))
}

impl MirrorTopic {
    fn into_topic_info(self) -> TransportResult<TopicInfo> {
        let topic_id: TopicId = self.topic_id.parse().map_err(|e| malformed("topic_id", e))?;
        let auto_renew_account_id = self
            .auto_renew_account
            .map(|a| a.parse::<AccountId>())
            .transpose()
            .map_err(|e| malformed("auto_renew_account", e))?;
        Ok(TopicInfo {
            topic_id,
            memo: self.memo,
            admin_key: self.admin_key.map(MirrorKey::canonical),
            submit_key: self.submit_key.map(MirrorKey::canonical),
            auto_renew_period: self.auto_renew_period,
            auto_renew_account_id,
            expiration_time: None,
        })
    }
}

impl MirrorMessage {
    fn into_topic_message(self, topic_id: TopicId) -> TransportResult<TopicMessage> {
        let consensus_timestamp = ConsensusTimestamp::parse(&self.consensus_timestamp)
            .map_err(|e| malformed("consensus_timestamp", e))?;
        let contents = STANDARD
            .decode(self.message.as_bytes())
            .map_err(|e| malformed("message", e))?;
        Ok(TopicMessage::new(topic_id, consensus_timestamp, self.sequence_number, contents))
    }
}

#[async_trait]
impl ReadTransport for RestTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    async fn topic_info(&self, topic_id: &TopicId) -> TransportResult<TopicInfo> {
        let url = self.join(&format!("/api/v1/topics/{topic_id}"))?;
        let topic: MirrorTopic = self.get_json(url, topic_id).await?;
        if topic.deleted {
            debug!(topic_id = %topic_id, "mirror reports topic deleted");
            return Err(TransportError::NotFound(*topic_id));
        }
        topic.into_topic_info()
    }

    async fn topic_messages(
        &self,
        topic_id: &TopicId,
        query: &MessageQuery,
    ) -> TransportResult<Vec<TopicMessage>> {
        let limit = query.limit.unwrap_or(usize::MAX);
        let mut url = self.messages_url(topic_id, query)?;
        let mut messages = Vec::new();
        let mut pages = 0usize;
        loop {
            let page: MirrorMessagePage = self.get_json(url, topic_id).await?;
            pages += 1;
            for raw in page.messages {
                if messages.len() == limit {
                    break;
                }
                messages.push(raw.into_topic_message(*topic_id)?);
            }
            match page.links.next {
                Some(next) if messages.len() < limit => url = self.join(&next)?,
                _ => break,
            }
        }
        debug!(topic_id = %topic_id, count = messages.len(), pages, "fetched mirror messages");
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode as AxumStatus;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const RAW_KEY: &str = "3b6a27bcceb6a42d62a3a8d02a6f0d73653215771de243a63ac048a18b59da29";
    const DER_PREFIX: &str = "302a300506032b6570032100";

    #[derive(Clone)]
    struct Mirror {
        requests: Arc<AtomicUsize>,
        /// `(seconds, body)` of every message on topic 0.0.100.
        messages: Arc<Vec<(i64, &'static str)>>,
        page_size: usize,
    }

    async fn topic_route(State(mirror): State<Mirror>, Path(id): Path<String>) -> Response {
        mirror.requests.fetch_add(1, Ordering::SeqCst);
        match id.as_str() {
            "0.0.404" => AxumStatus::NOT_FOUND.into_response(),
            "0.0.500" => AxumStatus::INTERNAL_SERVER_ERROR.into_response(),
            "0.0.9" => Json(json!({"topic_id": id, "memo": "gone", "deleted": true})).into_response(),
            _ => Json(json!({
                "topic_id": id,
                "memo": "hello",
                "admin_key": {"_type": "ED25519", "key": RAW_KEY},
                "submit_key": null,
                "auto_renew_period": 7776000,
                "auto_renew_account": "0.0.2",
                "deleted": false,
                "created_timestamp": "1700000000.000000000"
            }))
            .into_response(),
        }
    }

    fn bound(params: &[(String, String)], op: &str) -> Option<ConsensusTimestamp> {
        params
            .iter()
            .filter(|(k, _)| k == "timestamp")
            .find_map(|(_, v)| v.strip_prefix(op).map(|t| ConsensusTimestamp::parse(t).unwrap()))
    }

    async fn messages_route(
        State(mirror): State<Mirror>,
        Path(id): Path<String>,
        Query(params): Query<Vec<(String, String)>>,
    ) -> Response {
        mirror.requests.fetch_add(1, Ordering::SeqCst);
        let gte = bound(&params, "gte:");
        let gt = bound(&params, "gt:");
        let lte = bound(&params, "lte:");
        let selected: Vec<_> = mirror
            .messages
            .iter()
            .map(|(secs, body)| (ConsensusTimestamp::new(*secs, 0), *body))
            .filter(|(ts, _)| gte.map_or(true, |b| *ts >= b))
            .filter(|(ts, _)| gt.map_or(true, |b| *ts > b))
            .filter(|(ts, _)| lte.map_or(true, |b| *ts <= b))
            .collect();
        let page: Vec<_> = selected.iter().take(mirror.page_size).collect();
        let next = (selected.len() > page.len()).then(|| {
            let last = page.last().map(|(ts, _)| ts.to_string()).unwrap_or_default();
            let mut next = format!("/api/v1/topics/{id}/messages?limit={}&encoding=base64&order=asc&timestamp=gt:{last}", mirror.page_size);
            if let Some(end) = lte {
                next.push_str(&format!("&timestamp=lte:{end}"));
            }
            next
        });
        let body: Vec<_> = page
            .iter()
            .enumerate()
            .map(|(i, (ts, text))| {
                json!({
                    "consensus_timestamp": ts.to_string(),
                    "message": STANDARD.encode(text),
                    "sequence_number": i + 1,
                    "topic_id": id,
                })
            })
            .collect();
        Json(json!({"messages": body, "links": {"next": next}})).into_response()
    }

    async fn serve(messages: Vec<(i64, &'static str)>) -> (RestTransport, Arc<AtomicUsize>) {
        serve_at("", messages).await
    }

    /// Fake mirror mounted under `prefix`, e.g. `/mirror`.
    async fn serve_at(prefix: &str, messages: Vec<(i64, &'static str)>) -> (RestTransport, Arc<AtomicUsize>) {
        let requests = Arc::new(AtomicUsize::new(0));
        let mirror = Mirror {
            requests: requests.clone(),
            messages: Arc::new(messages),
            page_size: 2,
        };
        let app = Router::new()
            .route("/api/v1/topics/:id", get(topic_route))
            .route("/api/v1/topics/:id/messages", get(messages_route))
            .with_state(mirror);
        let app = if prefix.is_empty() { app } else { Router::new().nest(prefix, app) };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = RestConfig {
            base_url: format!("http://{addr}{prefix}"),
            page_size: 2,
            request_timeout_ms: 5_000,
        };
        (RestTransport::new(&config).unwrap(), requests)
    }

    fn query() -> MessageQuery {
        MessageQuery::new(Duration::from_secs(1))
    }

    // ---- Topic info ----

    #[tokio::test]
    async fn topic_info_is_normalized() {
        let (transport, _) = serve(Vec::new()).await;
        let info = transport.topic_info(&TopicId::new(0, 0, 100)).await.unwrap();
        assert_eq!(info.memo, "hello");
        assert_eq!(info.admin_key, Some(format!("{DER_PREFIX}{RAW_KEY}")));
        assert_eq!(info.submit_key, None);
        assert_eq!(info.auto_renew_period, Some(7_776_000));
        assert_eq!(info.auto_renew_account_id, Some(AccountId::new(0, 0, 2)));
        assert_eq!(info.expiration_time, None);
    }

    #[tokio::test]
    async fn deleted_topic_is_not_found() {
        let (transport, _) = serve(Vec::new()).await;
        let err = transport.topic_info(&TopicId::new(0, 0, 9)).await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound(id) if id == TopicId::new(0, 0, 9)));
    }

    #[tokio::test]
    async fn missing_topic_is_not_found() {
        let (transport, _) = serve(Vec::new()).await;
        let err = transport.topic_info(&TopicId::new(0, 0, 404)).await.unwrap_err();
        assert!(matches!(err, TransportError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_carries_status() {
        let (transport, _) = serve(Vec::new()).await;
        let err = transport.topic_info(&TopicId::new(0, 0, 500)).await.unwrap_err();
        match err {
            TransportError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    // ---- Messages ----

    #[tokio::test]
    async fn follows_next_links_in_order() {
        let bodies = vec![(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")];
        let (transport, requests) = serve(bodies).await;
        let messages = transport
            .topic_messages(&TopicId::new(0, 0, 100), &query())
            .await
            .unwrap();
        let got: Vec<_> = messages.iter().map(|m| m.contents_str().unwrap()).collect();
        assert_eq!(got, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(requests.load(Ordering::SeqCst), 3);
        assert!(messages.iter().all(|m| m.topic_id == TopicId::new(0, 0, 100)));
    }

    #[tokio::test]
    async fn time_bounds_become_filters() {
        let bodies = vec![(1, "a"), (2, "b"), (3, "c"), (4, "d")];
        let (transport, _) = serve(bodies).await;
        let q = MessageQuery {
            start: Some(ConsensusTimestamp::new(2, 0)),
            end: Some(ConsensusTimestamp::new(3, 0)),
            ..query()
        };
        let messages = transport.topic_messages(&TopicId::new(0, 0, 100), &q).await.unwrap();
        let got: Vec<_> = messages.iter().map(|m| m.contents_str().unwrap()).collect();
        assert_eq!(got, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn limit_stops_paging() {
        let bodies = vec![(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")];
        let (transport, requests) = serve(bodies).await;
        let q = MessageQuery {
            limit: Some(3),
            ..query()
        };
        let messages = transport.topic_messages(&TopicId::new(0, 0, 100), &q).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn empty_topic_has_no_messages() {
        let (transport, _) = serve(Vec::new()).await;
        let messages = transport
            .topic_messages(&TopicId::new(0, 0, 100), &query())
            .await
            .unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn messages_url_carries_query() {
        let transport = RestTransport::new(&RestConfig {
            base_url: "http://mirror.local".into(),
            ..RestConfig::default()
        })
        .unwrap();
        let q = MessageQuery {
            start: Some(ConsensusTimestamp::new(10, 5)),
            end: Some(ConsensusTimestamp::new(20, 0)),
            ..query()
        };
        let url = transport.messages_url(&TopicId::new(0, 0, 7), &q).unwrap();
        assert_eq!(url.path(), "/api/v1/topics/0.0.7/messages");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("limit".into(), "25".into())));
        assert!(pairs.contains(&("encoding".into(), "base64".into())));
        assert!(pairs.contains(&("order".into(), "asc".into())));
        assert!(pairs.contains(&("timestamp".into(), "gte:10.000000005".into())));
        assert!(pairs.contains(&("timestamp".into(), "lte:20.000000000".into())));
    }

    #[tokio::test]
    async fn base_path_prefix_is_kept() {
        let bodies = vec![(1, "a"), (2, "b"), (3, "c")];
        let (transport, requests) = serve_at("/mirror", bodies).await;
        let info = transport.topic_info(&TopicId::new(0, 0, 100)).await.unwrap();
        assert_eq!(info.memo, "hello");

        // Next links come back root-relative, without the prefix.
        let messages = transport
            .topic_messages(&TopicId::new(0, 0, 100), &query())
            .await
            .unwrap();
        let got: Vec<_> = messages.iter().map(|m| m.contents_str().unwrap()).collect();
        assert_eq!(got, vec!["a", "b", "c"]);
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn join_resolves_under_base_path() {
        let transport = RestTransport::new(&RestConfig {
            base_url: "http://proxy.local/mirror".into(),
            ..RestConfig::default()
        })
        .unwrap();
        assert_eq!(transport.base_url().path(), "/mirror/");
        let q = query();
        let url = transport.messages_url(&TopicId::new(0, 0, 7), &q).unwrap();
        assert_eq!(url.path(), "/mirror/api/v1/topics/0.0.7/messages");
        assert_eq!(
            transport.join("/api/v1/topics/0.0.7").unwrap().as_str(),
            "http://proxy.local/mirror/api/v1/topics/0.0.7"
        );
        assert_eq!(
            transport.join("/mirror/api/v1/topics/0.0.7?limit=2").unwrap().as_str(),
            "http://proxy.local/mirror/api/v1/topics/0.0.7?limit=2"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = RestConfig {
            base_url: "not a url".into(),
            ..RestConfig::default()
        };
        assert!(matches!(RestTransport::new(&config), Err(TransportError::InvalidUrl(_))));
    }
}
