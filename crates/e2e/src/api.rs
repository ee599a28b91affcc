//! HTTP client for the AgroRed REST API

use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// Bearer token returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

/// Payload for `POST /api/v1/products`.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub name: String,
    pub price: u32,
    pub stock: u32,
    pub whatsapp_number: String,
    pub category: String,
}

impl NewProduct {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: 500,
            stock: 500,
            whatsapp_number: "0123456789".to_string(),
            category: "Fruta".to_string(),
        }
    }
}

/// The `_id` of an API document, whether serialized as a string or a number.
pub fn document_id(doc: &Value) -> Option<String> {
    match doc.get("_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> E2eResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }

    /// Turn a non-success status into [`E2eError::Status`] carrying the body text.
    async fn check(response: Response) -> E2eResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(E2eError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Like [`Self::check`] but maps 404 to `None`.
    async fn check_optional(response: Response) -> E2eResult<Option<Value>> {
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json().await?))
    }

    pub async fn register_user(&self, full_name: &str, email: &str, password: &str) -> E2eResult<Value> {
        let response = self
            .client
            .post(self.url("users"))
            .json(&serde_json::json!({
                "full_name": full_name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;
        let user: Value = Self::check(response).await?.json().await?;
        debug!("Registration response: {}", user);
        Ok(user)
    }

    /// OAuth2 password-flow login; the API expects the email as `username`.
    pub async fn login(&self, email: &str, password: &str) -> E2eResult<AccessToken> {
        let response = self
            .client
            .post(self.url("auth/login"))
            .form(&[("username", email), ("password", password)])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_product(&self, token: &str, product: &NewProduct) -> E2eResult<Value> {
        let response = self
            .client
            .post(self.url("products"))
            .bearer_auth(token)
            .json(product)
            .send()
            .await?;
        let created: Value = Self::check(response).await?.json().await?;
        debug!("Product creation response: {}", created);
        Ok(created)
    }

    /// `None` on any error status; only transport failures are errors.
    pub async fn get_product(&self, id: &str) -> E2eResult<Option<Value>> {
        let response = self.client.get(self.url(&format!("products/{}", id))).send().await?;
        if !response.status().is_success() {
            debug!("Product {} lookup answered {}", id, response.status());
            return Ok(None);
        }
        Ok(Some(response.json().await?))
    }

    pub async fn list_products(&self) -> E2eResult<Vec<Value>> {
        let response = self.client.get(self.url("products")).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_product(&self, token: &str, id: &str) -> E2eResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("products/{}", id)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// `None` when the user does not exist.
    pub async fn get_user(&self, id: &str, token: &str) -> E2eResult<Option<Value>> {
        let response = self
            .client
            .get(self.url(&format!("users/{}", id)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check_optional(response).await
    }

    pub async fn delete_user(&self, token: &str, id: &str) -> E2eResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("users/{}", id)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
