//! HTTPS client for the secret-service API.
//!
//! Two endpoints: listing secret metadata and fetching one encrypted secret.
//! Both resolve an access token through [`AuthClient`] first; the fetch path
//! additionally pipes the response through envelope decryption.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::auth::AuthClient;
use crate::bootstrap::BootstrapIdentity;
use crate::envelope::SecretEnvelope;
use crate::error::Error;

/// Failure of a list/get API call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response from {endpoint} had an unexpected shape: {reason}")]
    Shape { endpoint: String, reason: String },
}

/// One listed secret's metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretMetadata {
    pub id: String,
    pub description: String,
}

/// Wire shape of one entry in the deploy response.
#[derive(Debug, Deserialize)]
struct DeployEntry {
    key: String,
}

/// Authenticated client for the secret-service API endpoints.
pub struct SecretServiceClient {
    client: reqwest::Client,
    api_host: String,
    auth: AuthClient,
}

impl SecretServiceClient {
    pub fn new(client: reqwest::Client, api_host: impl Into<String>, auth: AuthClient) -> Self {
        Self {
            client,
            api_host: api_host.into(),
            auth,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &str,
    ) -> Result<T, ServiceError> {
        let response = self
            .client
            .get(endpoint)
            .query(&[("access_token", token)])
            .send()
            .await
            .map_err(|source| ServiceError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        let body = response.text().await.map_err(|source| ServiceError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|err| ServiceError::Shape {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })
    }

    /// List secret ids with their descriptions.
    ///
    /// Duplicate ids in the response collapse to the last occurrence.
    pub async fn list_secrets(
        &self,
        identity: &BootstrapIdentity,
    ) -> Result<HashMap<String, String>, Error> {
        let token = self.auth.resolve_access_token(identity).await?;
        let endpoint = format!("{}/apps/{}/keys", self.api_host, identity.app_id);

        let entries: Vec<SecretMetadata> = self.get_json(&endpoint, &token).await?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.id, entry.description))
            .collect())
    }

    /// Fetch one secret and decrypt it with the identity's passphrase.
    pub async fn get_secret(
        &self,
        identity: &BootstrapIdentity,
        secret_id: &str,
    ) -> Result<String, Error> {
        let token = self.auth.resolve_access_token(identity).await?;
        let endpoint = format!(
            "{}/apps/{}/deploy/{}",
            self.api_host, identity.app_id, secret_id
        );

        let mut entries: HashMap<String, DeployEntry> = self.get_json(&endpoint, &token).await?;
        let entry = entries
            .remove(secret_id)
            .ok_or_else(|| ServiceError::Shape {
                endpoint: endpoint.clone(),
                reason: format!("no entry for secret {secret_id:?}"),
            })?;

        let envelope = SecretEnvelope::parse(&entry.key)?;
        Ok(envelope.decrypt(&identity.decryption_key)?)
    }
}
