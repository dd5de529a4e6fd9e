use crate::domain::model::{CollectionKind, Credentials, RelationshipRecord};
use crate::domain::ports::{ConfigProvider, MutationStatus, RelationshipMutator, RelationshipSource};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_LENGTH};
use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const USER_AGENT: &str = concat!("follow-sync/", env!("CARGO_PKG_VERSION"));
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub REST implementation of both relationship ports.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: Url,
}

impl GitHubClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| SyncError::InvalidConfigValue {
            field: "api_base_url".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidConfigValue {
                field: "api_base_url".to_string(),
                value: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::new(config.api_base_url(), config.request_timeout())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn collection_url(&self, identity: &str, kind: CollectionKind) -> Url {
        self.endpoint(&["users", identity, kind.as_str()])
    }

    pub fn relationship_url(&self, login: &str) -> Url {
        self.endpoint(&["user", "following", login])
    }

    fn request(&self, method: Method, url: Url, credentials: &Credentials) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&credentials.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(CACHE_CONTROL, "no-cache")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    async fn mutate(
        &self,
        method: Method,
        credentials: &Credentials,
        login: &str,
    ) -> Result<MutationStatus> {
        let url = self.relationship_url(login);
        tracing::debug!("📡 {} {}", method, url);

        let response = self
            .request(method, url, credentials)
            .header(CONTENT_LENGTH, 0)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 {}: response status {}", login, status);
        Ok(MutationStatus(status.as_u16()))
    }
}

#[async_trait]
impl RelationshipSource for GitHubClient {
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        kind: CollectionKind,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RelationshipRecord>> {
        let url = self.collection_url(&credentials.identity, kind);
        tracing::debug!("📡 Fetching {} page {} from {}", kind, page, url);

        let response = self
            .request(Method::GET, url, credentials)
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus {
                kind,
                page,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let records: Vec<RelationshipRecord> = serde_json::from_slice(&body)?;
        tracing::debug!("📡 {} page {}: {} records", kind, page, records.len());
        Ok(records)
    }
}

#[async_trait]
impl RelationshipMutator for GitHubClient {
    async fn follow(&self, credentials: &Credentials, login: &str) -> Result<MutationStatus> {
        self.mutate(Method::PUT, credentials, login).await
    }

    async fn unfollow(&self, credentials: &Credentials, login: &str) -> Result<MutationStatus> {
        self.mutate(Method::DELETE, credentials, login).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{ErrorCategory, ErrorSeverity};
    use httpmock::prelude::*;

    fn credentials() -> Credentials {
        Credentials::new("octocat", "t0ken")
    }

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_building() {
        let client = GitHubClient::new("https://ghe.example.com/api/v3/", Duration::from_secs(5))
            .unwrap();

        assert_eq!(
            client
                .collection_url("octocat", CollectionKind::Following)
                .as_str(),
            "https://ghe.example.com/api/v3/users/octocat/following"
        );
        assert_eq!(
            client.relationship_url("some-user").as_str(),
            "https://ghe.example.com/api/v3/user/following/some-user"
        );
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(GitHubClient::new("mailto:someone@example.com", Duration::from_secs(5)).is_err());
        assert!(GitHubClient::new("not a url", Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_fetch_page_sends_pagination_and_auth() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/octocat/followers")
                .query_param("page", "2")
                .query_param("per_page", "100")
                .header("authorization", "Bearer t0ken")
                .header("cache-control", "no-cache");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([
                    {"login": "alice", "id": 1, "avatar_url": "https://example.com/a.png"},
                    {"login": "bob", "id": 2, "type": "User"}
                ]));
        });

        let records = client(&server)
            .fetch_page(&credentials(), CollectionKind::Followers, 2, 100)
            .await
            .unwrap();

        page_mock.assert();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].login, "alice");
        assert_eq!(records[1].login, "bob");
    }

    #[tokio::test]
    async fn test_fetch_page_non_success_status() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/users/octocat/following");
            then.status(403);
        });

        let result = client(&server)
            .fetch_page(&credentials(), CollectionKind::Following, 1, 100)
            .await;

        page_mock.assert();
        match result {
            Err(SyncError::UnexpectedStatus { kind, page, status }) => {
                assert_eq!(kind, CollectionKind::Following);
                assert_eq!(page, 1);
                assert_eq!(status, 403);
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_malformed_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/octocat/followers");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!([{"id": 7}]));
        });

        let result = client(&server)
            .fetch_page(&credentials(), CollectionKind::Followers, 1, 100)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_html_body_is_a_data_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/octocat/followers");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html><body>Sign in</body></html>");
        });

        let err = client(&server)
            .fetch_page(&credentials(), CollectionKind::Followers, 1, 100)
            .await
            .unwrap_err();
        let err = SyncError::collection(CollectionKind::Followers, err);

        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("--api-base-url"));
        assert!(!err.user_friendly_message().contains("Could not reach the API"));
    }

    #[tokio::test]
    async fn test_request_timeout_is_enforced() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/users/octocat/following");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(serde_json::json!([]));
        });

        let client = GitHubClient::new(&server.base_url(), Duration::from_millis(200)).unwrap();
        let err = client
            .fetch_page(&credentials(), CollectionKind::Following, 1, 100)
            .await
            .unwrap_err();

        match &err {
            SyncError::Transport(e) => assert!(e.is_timeout()),
            other => panic!("expected transport timeout, got {:?}", other),
        }
        assert!(err.is_transient());
        assert_eq!(err.user_friendly_message(), "The request timed out");
    }

    #[tokio::test]
    async fn test_follow_and_unfollow_report_status() {
        let server = MockServer::start();
        let follow_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/user/following/alice")
                .header("authorization", "Bearer t0ken");
            then.status(204);
        });
        let unfollow_mock = server.mock(|when, then| {
            when.method(DELETE).path("/user/following/mallory");
            then.status(404);
        });

        let client = client(&server);
        let followed = client.follow(&credentials(), "alice").await.unwrap();
        let unfollowed = client.unfollow(&credentials(), "mallory").await.unwrap();

        follow_mock.assert();
        unfollow_mock.assert();
        assert!(followed.is_success());
        assert_eq!(unfollowed, MutationStatus(404));
        assert!(!unfollowed.is_success());
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let client = GitHubClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let result = client.follow(&credentials(), "alice").await;

        let err = result.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(err.is_transient());
    }
}
