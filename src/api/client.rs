use crate::api::Remote;
use crate::api::models::{Contact, ContactDraft};
use crate::error::{ContactError, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde_json::Value;
use url::Url;

pub struct ApiClient {
    pub http: HttpClient,
    base: Url,
}

impl ApiClient {
    /// Client for the collection rooted at `base_url` (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_http(HttpClient::new(), base_url)
    }

    pub fn with_http(http: HttpClient, base_url: &str) -> Result<Self> {
        let normalized = crate::utils::normalize_url(base_url);
        let base = Url::parse(&normalized)
            .map_err(|e| ContactError::Config(format!("invalid API url '{}': {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ContactError::Config(format!("API url '{}' cannot be a base", base_url)));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn collection_url(&self) -> Url {
        self.endpoint(&[])
    }

    fn item_url(&self, id: &str) -> Url {
        self.endpoint(&[id])
    }

    fn endpoint(&self, extra: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base urls, so segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("contacts").extend(extra);
        }
        url
    }

    /// Passes success responses through. A 404 maps to `NotFound` only when the
    /// request targeted a specific id.
    async fn check(resp: Response, id: Option<&str>) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ContactError::NotFound(id.to_string()));
            }
        }
        let detail = resp
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string));
        Err(ContactError::Network(match detail {
            Some(d) => format!("HTTP {}: {}", status, d),
            None => format!("HTTP {}", status),
        }))
    }

    async fn decode_contact(resp: Response) -> Result<Contact> {
        let contact = resp
            .json::<Contact>()
            .await
            .map_err(|e| ContactError::Network(format!("malformed contact in response: {}", e)))?;
        Ok(contact)
    }
}

#[async_trait]
impl Remote for ApiClient {
    async fn list(&self) -> Result<Vec<Contact>> {
        let url = self.collection_url();
        log::debug!("GET {}", url);
        let resp = Self::check(self.http.get(url).send().await?, None).await?;
        let json: Value = resp.json().await?;
        let items = json
            .as_array()
            .cloned()
            .or_else(|| json.get("contacts").and_then(|v| v.as_array()).cloned())
            .or_else(|| json.get("data").and_then(|v| v.as_array()).cloned())
            .ok_or_else(|| ContactError::Network("expected a list of contacts".into()))?;
        let contacts = items
            .into_iter()
            .map(serde_json::from_value::<Contact>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ContactError::Network(format!("malformed contact in response: {}", e)))?;
        log::debug!("fetched {} contact(s)", contacts.len());
        Ok(contacts)
    }

    async fn create(&self, draft: &ContactDraft) -> Result<Contact> {
        let url = self.collection_url();
        log::debug!("POST {}", url);
        let resp = Self::check(self.http.post(url).json(draft).send().await?, None).await?;
        Self::decode_contact(resp).await
    }

    async fn update(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
        let url = self.item_url(id);
        log::debug!("PUT {}", url);
        let resp = Self::check(self.http.put(url).json(draft).send().await?, Some(id)).await?;
        Self::decode_contact(resp).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.item_url(id);
        log::debug!("DELETE {}", url);
        Self::check(self.http.delete(url).send().await?, Some(id)).await?;
        Ok(())
    }
}
