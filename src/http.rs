use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::StoreConfig;
use crate::error::{ClientError, ClientResult, FieldError};
use crate::session::SessionService;

/// HTTP boundary to the storefront backend.
///
/// Attaches the stored bearer credential when present and maps non-2xx
/// responses onto [`ClientError`]. A 401 evicts the credential before the
/// error is returned, forcing callers back to an unauthenticated state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionService>,
}

impl ApiClient {
    pub fn new(config: &StoreConfig, session: Arc<SessionService>) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    pub async fn put_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        self.send(self.http.put(self.url(path)).query(query)).await
    }

    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.http.delete(self.url(path))).await
    }

    /// DELETE where the response body is not used.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let resp = self.authorize(self.http.delete(self.url(path))).send().await?;
        self.check(resp).await?;
        Ok(())
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.credential() {
            Some(credential) => req.bearer_auth(credential.token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let resp = self.authorize(req).send().await?;
        let resp = self.check(resp).await?;
        Ok(resp.json().await?)
    }

    async fn check(&self, resp: Response) -> ClientResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            if let Err(err) = self.session.clear_credential() {
                tracing::warn!(error = %err, "failed to evict credential after 401");
            }
            return Err(ClientError::Unauthorized);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(parse_error_body(status.as_u16(), &body))
    }
}

fn parse_error_body(status: u16, body: &str) -> ClientError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        detail: DetailPayload,
    }

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum DetailPayload {
        Message(String),
        Fields(Vec<RawFieldError>),
    }

    #[derive(serde::Deserialize)]
    struct RawFieldError {
        #[serde(default)]
        loc: Vec<serde_json::Value>,
        msg: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: DetailPayload::Fields(fields),
        }) => ClientError::Validation(
            fields
                .into_iter()
                .map(|raw| FieldError {
                    field: raw
                        .loc
                        .last()
                        .map(field_name)
                        .unwrap_or_else(|| "body".to_string()),
                    message: raw.msg,
                })
                .collect(),
        ),
        Ok(ErrorBody {
            detail: DetailPayload::Message(message),
        }) => ClientError::Server { status, message },
        Err(_) => ClientError::Server {
            status,
            message: if body.is_empty() {
                "request failed".to_string()
            } else {
                body.chars().take(200).collect()
            },
        },
    }
}

fn field_name(loc: &serde_json::Value) -> String {
    match loc {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
