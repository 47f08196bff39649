// HTTP plumbing shared by every project operation: URL building, auth, error mapping

use crate::error::{AgentsError, Result};
use foundry_llm::{Credential, AI_AZURE_SCOPE};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Resource named in a `NotFound` error when the service answers 404
#[derive(Debug, Clone, Copy)]
pub(crate) struct Resource<'a> {
    pub kind: &'static str,
    pub id: &'a str,
}

#[derive(Debug)]
pub(crate) struct Pipeline {
    http: reqwest::Client,
    endpoint: String,
    api_version: String,
    credential: Credential,
}

impl Pipeline {
    pub fn new(
        endpoint: String,
        api_version: String,
        credential: Credential,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_version,
            credential,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        self.http
            .request(method, url)
            .query(&[("api-version", self.api_version.as_str())])
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        resource: Option<Resource<'_>>,
    ) -> Result<T> {
        let builder = self.request(Method::GET, path).query(query);
        self.execute(builder, resource).await
    }

    /// Follow a server-provided continuation link; it already carries the query
    pub async fn get_link<T: DeserializeOwned>(&self, link: &str) -> Result<T> {
        let builder = self.http.get(link);
        self.execute(builder, None).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        resource: Option<Resource<'_>>,
    ) -> Result<T> {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(builder, resource).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: Option<Resource<'_>>,
    ) -> Result<T> {
        let builder = self.request(Method::DELETE, path);
        self.execute(builder, resource).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: Option<Resource<'_>>,
    ) -> Result<T> {
        let builder = self
            .credential
            .authorize(builder, AI_AZURE_SCOPE)
            .await
            .map_err(|e| AgentsError::Credential(format!("{:#}", e)))?;

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        tracing::debug!(status = status.as_u16(), "Project API request failed: {}", body);

        match (status, resource) {
            (StatusCode::NOT_FOUND, Some(resource)) => Err(AgentsError::NotFound {
                kind: resource.kind,
                id: resource.id.to_string(),
            }),
            _ => Err(AgentsError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            }),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// Prefer the service's `{"error": {"code", "message"}}` envelope over the raw body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope { error: ErrorBody { code: Some(code), message } }) => {
            format!("{}: {}", code, message)
        }
        Ok(envelope) => envelope.error.message,
        Err(_) if body.is_empty() => "no response body".to_string(),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_envelope() {
        let body = r#"{"error":{"code":"invalid_request","message":"No assistant found"}}"#;
        assert_eq!(error_message(body), "invalid_request: No assistant found");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"error":{"message":"boom"}}"#), "boom");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message(""), "no response body");
    }
}
