use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{redirect, Method, RequestBuilder};
use serde::Serialize;
use tracing::debug;

use crate::error::{RemoteError, Result};
use crate::types::{RemoteItem, ResourceKind, Upsert, UpsertResponse, ValidationResponse};

/// Static API credentials, sent as HTTP basic auth on every request.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

/// Authenticated client for one API base URL. Redirects are never followed.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl RemoteClient {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(|e| RemoteError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Create or update `slug`. 201 → created, 200 → updated; 422 carries the
    /// API's validation errors; any other status is unexpected.
    pub async fn upsert<T>(&self, kind: ResourceKind, slug: &str, payload: &T) -> Result<Upsert>
    where
        T: Serialize + ?Sized,
    {
        let url = self.item_url(kind, slug);
        debug!(%kind, slug, %url, "PUT");

        let resp = self.request(Method::PUT, &url).json(payload).send().await?;
        let status = resp.status().as_u16();

        match status {
            200 | 201 => {
                let body: UpsertResponse = resp
                    .json()
                    .await
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                Ok(if status == 201 {
                    Upsert::Created { url: body.url }
                } else {
                    Upsert::Updated { url: body.url }
                })
            }
            422 => {
                let body: ValidationResponse = resp
                    .json()
                    .await
                    .map_err(|e| RemoteError::Decode(e.to_string()))?;
                Err(RemoteError::Validation {
                    errors: body.errors,
                })
            }
            _ => {
                debug!(%kind, slug, status, "unexpected upsert status");
                Err(RemoteError::UnexpectedStatus { status })
            }
        }
    }

    /// Slugs of every remote resource of `kind`, in the order the API
    /// returns them.
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<String>> {
        let url = format!("{}/{}/", self.base_url, kind.url_prefix());
        debug!(%kind, %url, "GET");

        let resp = self.request(Method::GET, &url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            debug!(%kind, status = status.as_u16(), "listing failed");
            return Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let items: Vec<RemoteItem> = resp
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(items.into_iter().map(|i| i.slug).collect())
    }

    /// Delete `slug`. Only transport failures are errors; the status code is
    /// logged and otherwise ignored.
    pub async fn delete(&self, kind: ResourceKind, slug: &str) -> Result<()> {
        let url = self.item_url(kind, slug);
        debug!(%kind, slug, %url, "DELETE");

        let resp = self.request(Method::DELETE, &url).send().await?;
        debug!(%kind, slug, status = resp.status().as_u16(), "delete answered");
        Ok(())
    }

    fn item_url(&self, kind: ResourceKind, slug: &str) -> String {
        format!("{}/{}/{}", self.base_url, kind.url_prefix(), slug)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).basic_auth(
            &self.credentials.client_id,
            Some(&self.credentials.client_secret),
        )
    }
}
