//! Thin HTTP client for the REST endpoints this crate wraps.

pub mod feed;
pub mod response;
pub mod tracked_wallets;

use std::time::Instant;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use response::{ApiErrorBody, ApiResponse};

pub use feed::{FeedRequest, FeedResponse};
pub use response::Paging;
pub use tracked_wallets::{
    AddTrackedWalletRequest, GetTrackedWalletsRequest, TrackedWallet, TrackedWalletPaging,
    TrackedWalletsPage, WalletList, WalletType,
};

/// Authenticated client for the REST API.
#[derive(Clone)]
pub struct CieloClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CieloClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: crate::API_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Point the client at another deployment (or a test server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `base_url` with `segments` appended; an empty last segment keeps a
    /// trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(crate::API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
    }

    /// Send and return the raw body of a 200 response.
    async fn execute(&self, builder: RequestBuilder) -> Result<String> {
        let request = builder.build()?;
        let (method, url) = (request.method().clone(), request.url().path().to_string());
        let start = Instant::now();

        let resp = self.http.execute(request).await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!(%method, path = %url, status = status.as_u16(), elapsed = ?start.elapsed(), "api request");

        if status != StatusCode::OK {
            return Err(api_error(status, &body));
        }
        Ok(body)
    }

    /// GET `segments` and unwrap the `data` of the response envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> Result<T> {
        let mut builder = self.request(Method::GET, self.endpoint(segments)?);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let body = self.execute(builder).await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    /// Send `body` as JSON and unwrap the `data` of the response envelope.
    pub(crate) async fn send_json<B, T>(&self, method: Method, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, self.endpoint(segments)?).json(body);
        let body = self.execute(builder).await?;
        let envelope: ApiResponse<T> = serde_json::from_str(&body)?;
        Ok(envelope.data)
    }

    /// Like [`CieloClient::send_json`], ignoring the response body.
    pub(crate) async fn send_json_unit<B>(&self, method: Method, segments: &[&str], body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.request(method, self.endpoint(segments)?).json(body);
        self.execute(builder).await?;
        Ok(())
    }
}

impl std::fmt::Debug for CieloClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CieloClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn api_error(status: StatusCode, body: &str) -> Error {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        _ => body.trim().to_string(),
    };
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[test]
    fn endpoint_joins_segments_under_base_path() {
        let client = CieloClient::new("k");
        let url = client.endpoint(&["v1", "feed", ""]).unwrap();
        assert_eq!(url.as_str(), "https://feed-api.cielo.finance/api/v1/feed/");

        let client = CieloClient::new("k").with_base_url("http://127.0.0.1:9000");
        let url = client.endpoint(&["v1", "tracked-wallets"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/v1/tracked-wallets");
    }

    #[test]
    fn endpoint_escapes_segments() {
        let client = CieloClient::new("k").with_base_url("http://localhost");
        let url = client.endpoint(&["v1", "address", "a/b c"]).unwrap();
        assert_eq!(url.path(), "/v1/address/a%2Fb%20c");
    }

    #[test]
    fn api_error_prefers_server_message() {
        let err = api_error(StatusCode::FORBIDDEN, r#"{"status":"error","message":"bad key"}"#);
        assert!(matches!(err, Error::Api { status: 403, ref message } if message == "bad key"));

        let err = api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, Error::Api { status: 502, ref message } if message == "upstream down"));

        let err = api_error(StatusCode::NOT_FOUND, "");
        assert!(err.is_not_found());
        assert!(matches!(err, Error::Api { ref message, .. } if message == "Not Found"));
    }

    #[tokio::test]
    async fn sends_auth_and_json_headers() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tracked-wallets")
            .match_header("x-api-key", "secret")
            .match_header("accept", "application/json")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"status":"ok","data":{"tracked_wallets":[],"paging":{}}}"#)
            .create_async()
            .await;

        let client = CieloClient::new("secret").with_base_url(server.url());
        let page = client
            .get_tracked_wallets(&GetTrackedWalletsRequest::default())
            .await
            .unwrap();
        assert!(page.tracked_wallets.is_empty());
    }

    #[tokio::test]
    async fn non_200_becomes_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tracked-wallets/address/0xabc")
            .with_status(404)
            .with_body(r#"{"status":"error","message":"wallet not tracked"}"#)
            .create_async()
            .await;

        let client = CieloClient::new("k").with_base_url(server.url());
        let err = client.get_wallet_by_address("0xabc").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "api returned 404: wallet not tracked");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v1/tracked-wallets/address/0xabc")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;

        let client = CieloClient::new("k").with_base_url(server.url());
        let err = client.get_wallet_by_address("0xabc").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
