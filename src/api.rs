use crate::consent::{ConsentGrant, ConsentRequest};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Response of the accept-consent call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub redirect_url: String,
}

/// Bearer-authenticated client for the authorization server's consent API.
#[derive(Debug, Clone)]
pub struct ConsentApi {
    http: reqwest::Client,
    base: Url,
}

impl ConsentApi {
    pub fn new(base: Url, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("http client");
        Self { http, base }
    }

    /// Fetch a pending consent request by id.
    pub async fn fetch(&self, id: &str, bearer: &str) -> Result<ConsentRequest> {
        let url = self.request_url(id, None);
        let response = self
            .http
            .get(url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(upstream_err)?;
        read_json(response).await
    }

    /// Accept a consent request with the given grant.
    pub async fn accept(&self, id: &str, bearer: &str, grant: &ConsentGrant) -> Result<AcceptResponse> {
        let url = self.request_url(id, Some("accept"));
        let response = self
            .http
            .post(url)
            .bearer_auth(bearer)
            .json(grant)
            .send()
            .await
            .map_err(upstream_err)?;
        read_json(response).await
    }

    fn request_url(&self, id: &str, action: Option<&str>) -> Url {
        let mut path = format!("/oauth2/consent/requests/{}", urlencoding::encode(id));
        if let Some(action) = action {
            path.push('/');
            path.push_str(action);
        }
        self.base.join(&path).expect("valid consent url")
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!(
            "consent endpoint gave status code {}, but status code 2xx was expected",
            status.as_u16()
        )));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| Error::Network(format!("invalid consent response: {}", e)))
}

fn upstream_err(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::UpstreamTimeout(e.to_string())
    } else {
        Error::Network(e.to_string())
    }
}
