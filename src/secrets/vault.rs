//! HashiCorp Vault KV v2 client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use url::Url;

/// Error type for secret store operations
///
/// Messages never contain secret values.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vault returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("token rejected by Vault ({status})")]
    Unauthorized { status: u16 },

    #[error("no secret at path '{path}'")]
    NotFound { path: String },

    #[error("secret has no field '{field}'")]
    MissingField { field: String },

    #[error("secret field '{field}' is not a string")]
    NotAString { field: String },

    #[error("no active session; login first")]
    NotLoggedIn,

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("invalid Vault address: {0}")]
    InvalidAddress(String),
}

/// A remote key/value secret store with an explicit session lifecycle
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Open a session
    async fn login(&self) -> Result<(), VaultError>;

    /// Read the key/value record stored at `path`
    async fn read(&self, path: &str) -> Result<Map<String, Value>, VaultError>;

    /// Close the session. Safe to call when no session is open.
    async fn logout(&self);
}

#[derive(Debug, Deserialize)]
struct KvV2Response {
    data: KvV2Data,
}

#[derive(Debug, Deserialize)]
struct KvV2Data {
    data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct VaultErrors {
    #[serde(default)]
    errors: Vec<String>,
}

/// Vault client using token authentication
pub struct VaultClient {
    client: Client,
    address: Url,
    token: SecretString,
    namespace: Option<String>,
    session: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.address.as_str())
            .field("namespace", &self.namespace)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl VaultClient {
    pub fn new(address: &str, token: SecretString, namespace: Option<String>) -> Result<Self, VaultError> {
        let mut address =
            Url::parse(address).map_err(|e| VaultError::InvalidAddress(format!("{}: {}", address, e)))?;
        if !address.path().ends_with('/') {
            let path = format!("{}/", address.path());
            address.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            address,
            token,
            namespace: namespace.filter(|ns| !ns.is_empty()),
            session: RwLock::new(None),
        })
    }

    /// `{address}/v1/{path}`
    fn endpoint(&self, path: &str) -> Result<Url, VaultError> {
        self.address
            .join(&format!("v1/{}", path.trim_start_matches('/')))
            .map_err(|e| VaultError::InvalidAddress(e.to_string()))
    }

    fn authorized(&self, request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        let request = request.header("X-Vault-Token", token.expose_secret());
        match &self.namespace {
            Some(ns) => request.header("X-Vault-Namespace", ns),
            None => request,
        }
    }
}

/// Map a `lookup-self` response
fn login_result(status: StatusCode, body: &str) -> Result<(), VaultError> {
    match status {
        s if s.is_success() => Ok(()),
        s @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            Err(VaultError::Unauthorized { status: s.as_u16() })
        }
        s => Err(status_error(s, body)),
    }
}

/// Map a KV v2 read response to the record's fields
fn read_result(status: StatusCode, path: &str, body: &str) -> Result<Map<String, Value>, VaultError> {
    match status {
        s if s.is_success() => {
            // serde messages can quote the offending value
            let record: KvV2Response = serde_json::from_str(body).map_err(|e| {
                VaultError::InvalidResponse(format!(
                    "not a KV v2 record (line {}, column {})",
                    e.line(),
                    e.column()
                ))
            })?;
            Ok(record.data.data)
        }
        StatusCode::NOT_FOUND => Err(VaultError::NotFound {
            path: path.to_string(),
        }),
        s @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            Err(VaultError::Unauthorized { status: s.as_u16() })
        }
        s => Err(status_error(s, body)),
    }
}

fn status_error(status: StatusCode, body: &str) -> VaultError {
    let message = match serde_json::from_str::<VaultErrors>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ => "no error details".to_string(),
    };
    VaultError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl SecretStore for VaultClient {
    async fn login(&self) -> Result<(), VaultError> {
        let url = self.endpoint("auth/token/lookup-self")?;
        tracing::debug!(address = %self.address, "Logging in to Vault");

        let response = self
            .authorized(self.client.get(url), &self.token)
            .send()
            .await?;
        let status = response.status();
        login_result(status, &response.text().await?)?;

        let token = SecretString::from(self.token.expose_secret().to_string());
        *self.session.write().await = Some(token);
        tracing::info!(address = %self.address, "Vault session opened");
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Map<String, Value>, VaultError> {
        let session = self.session.read().await;
        let token = session.as_ref().ok_or(VaultError::NotLoggedIn)?;
        let url = self.endpoint(path)?;
        tracing::debug!(path, "Reading secret from Vault");

        let response = self.authorized(self.client.get(url), token).send().await?;
        let status = response.status();
        read_result(status, path, &response.text().await?)
    }

    async fn logout(&self) {
        if self.session.write().await.take().is_some() {
            tracing::debug!(address = %self.address, "Vault session closed");
        }
    }
}
