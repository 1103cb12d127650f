//! Blocking HTTP adapter for the `SecretStore` port.
//!
//! Speaks the Vault API directly: KV2 data/metadata endpoints and the raw
//! logical endpoints, `LIST` as a custom method, `X-Vault-Token` auth. The
//! HTTP client's default timeouts apply; the tool adds no retries.

use crate::core::store::{BackendKind, SecretLocation, SecretStore};
use crate::models::settings::VaultSettings;
use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde_json::{json, Map, Value};
use tracing::debug;

pub struct VaultHttp {
    base: String,
    token: String,
    client: Client,
}

impl VaultHttp {
    pub fn new(settings: &VaultSettings) -> Result<Self> {
        if settings.addr.is_empty() {
            bail!("no vault address given, use --addr or env VAULT_ADDR");
        }
        if settings.token.is_empty() {
            bail!("no vault token given, use --token or env VAULT_TOKEN");
        }
        let client = Client::builder()
            .build()
            .context("build http client")?;
        Ok(Self {
            base: settings.addr.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            client,
        })
    }

    fn request(&self, method: Method, api_path: &str, body: Option<Value>) -> Result<Response> {
        let url = format!("{}/v1/{}", self.base, api_path.trim_start_matches('/'));
        debug!(%method, %url, "vault request");
        let mut req = self
            .client
            .request(method, &url)
            .header("X-Vault-Token", &self.token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send().with_context(|| format!("request {}", url))
    }
}

impl SecretStore for VaultHttp {
    fn read(&self, location: &SecretLocation) -> Result<Option<Map<String, Value>>> {
        let response = self.request(Method::GET, &location.data_path(), None)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: Value = response.json().context("decode vault read response")?;
                let data = match location.kind {
                    BackendKind::Kv2 => body.pointer("/data/data").cloned(),
                    BackendKind::Logical => body.get("data").cloned(),
                };
                match data {
                    Some(Value::Object(map)) => Ok(Some(map)),
                    Some(Value::Null) | None => Ok(None),
                    Some(other) => bail!("unexpected vault data shape: {}", other),
                }
            }
            status => bail!(
                "vault read of '{}' failed: {} {}",
                location.path,
                status,
                response.text().unwrap_or_default()
            ),
        }
    }

    fn write(&self, location: &SecretLocation, data: &Map<String, Value>) -> Result<()> {
        let body = match location.kind {
            BackendKind::Kv2 => json!({ "data": data }),
            BackendKind::Logical => Value::Object(data.clone()),
        };
        let response = self.request(Method::POST, &location.data_path(), Some(body))?;
        let status = response.status();
        if !status.is_success() {
            bail!(
                "vault write to '{}' failed: {} {}",
                location.path,
                status,
                response.text().unwrap_or_default()
            );
        }
        Ok(())
    }

    fn list(&self, location: &SecretLocation) -> Result<Vec<String>> {
        let method = Method::from_bytes(b"LIST").expect("LIST is a valid method");
        let response = self.request(method, &location.list_path(), None)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            status if status.is_success() => {
                let body: Value = response.json().context("decode vault list response")?;
                let keys = body
                    .pointer("/data/keys")
                    .and_then(Value::as_array)
                    .map(|keys| {
                        keys.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                Ok(keys)
            }
            status => bail!(
                "vault list of '{}' failed: {} {}",
                location.path,
                status,
                response.text().unwrap_or_default()
            ),
        }
    }
}
