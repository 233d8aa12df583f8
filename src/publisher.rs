//! Client for the remote authorization-inventory service.
//!
//! Publishing is a three-step orchestration: resolve (or create) the custom
//! provider, resolve (or create) the data source under it, then push the
//! serialized graph document. Soft warnings from the service are relayed to
//! the caller verbatim; hard failures surface as structured API errors.

use std::fmt;
use std::time::Duration;

use miette::Diagnostic;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::graph::GraphDocument;

const PUSH_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error, Diagnostic)]
pub enum PublisherError {
    #[error("invalid service base url `{url}`")]
    #[diagnostic(
        code(orrery::publisher::base_url),
        help("use an absolute http(s) url, e.g. https://inventory.example.com")
    )]
    InvalidBaseUrl { url: String },

    #[error("request to the authorization service failed")]
    #[diagnostic(code(orrery::publisher::http))]
    Http(#[from] reqwest::Error),

    #[error("service rejected the request ({status} {code}): {message}")]
    #[diagnostic(code(orrery::publisher::api))]
    Api {
        status: u16,
        code: String,
        message: String,
        details: Vec<String>,
    },

    #[error("failed to serialize the graph document")]
    #[diagnostic(code(orrery::publisher::serialize))]
    Serialize(#[from] serde_json::Error),
}

/// Template a provider is created from on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTemplate {
    Application,
    IdentityProvider,
}

impl ProviderTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderTemplate::Application => "application",
            ProviderTemplate::IdentityProvider => "identity_provider",
        }
    }
}

// `ValueList` puts a `Default` bound on its element type through the
// derived `Deserialize`, so both element types derive it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom_template: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSource {
    pub id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct PushOutcome {
    /// Soft warnings reported by the service, verbatim.
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ValueList<T> {
    #[serde(default)]
    values: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ValueEnvelope<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

pub struct Publisher {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Publisher {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, PublisherError> {
        let trimmed = base_url.trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(PublisherError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        let http = reqwest::Client::builder().timeout(PUSH_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Look a provider up by name, case-insensitively.
    pub async fn get_provider(&self, name: &str) -> Result<Option<Provider>, PublisherError> {
        let url = format!("{}/api/v1/providers/custom", self.base_url);
        let response = self.http.get(url).bearer_auth(&self.api_key).send().await?;
        let list: ValueList<Provider> = self.decode(response).await?;
        Ok(list
            .values
            .into_iter()
            .find(|provider| provider.name.eq_ignore_ascii_case(name)))
    }

    pub async fn create_provider(
        &self,
        name: &str,
        template: ProviderTemplate,
    ) -> Result<Provider, PublisherError> {
        let url = format!("{}/api/v1/providers/custom", self.base_url);
        let body = serde_json::json!({
            "name": name,
            "custom_template": template.as_str(),
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let envelope: ValueEnvelope<Provider> = self.decode(response).await?;
        Ok(envelope.value)
    }

    pub async fn get_data_source(
        &self,
        provider_id: &str,
        name: &str,
    ) -> Result<Option<DataSource>, PublisherError> {
        let url = format!(
            "{}/api/v1/providers/custom/{}/datasources",
            self.base_url, provider_id
        );
        let response = self.http.get(url).bearer_auth(&self.api_key).send().await?;
        let list: ValueList<DataSource> = self.decode(response).await?;
        Ok(list
            .values
            .into_iter()
            .find(|source| source.name.eq_ignore_ascii_case(name)))
    }

    pub async fn create_data_source(
        &self,
        provider_id: &str,
        name: &str,
    ) -> Result<DataSource, PublisherError> {
        let url = format!(
            "{}/api/v1/providers/custom/{}/datasources",
            self.base_url, provider_id
        );
        let body = serde_json::json!({
            "name": name,
            "id": provider_id,
        });
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let envelope: ValueEnvelope<DataSource> = self.decode(response).await?;
        Ok(envelope.value)
    }

    /// Publish `document` under `provider_name`/`data_source_name`, creating
    /// both on the service if this is the first push.
    pub async fn push_application(
        &self,
        provider_name: &str,
        data_source_name: &str,
        document: &GraphDocument,
    ) -> Result<PushOutcome, PublisherError> {
        let provider = match self.get_provider(provider_name).await? {
            Some(provider) => provider,
            None => {
                tracing::info!(provider = provider_name, "provider not found, creating it");
                self.create_provider(provider_name, ProviderTemplate::Application)
                    .await?
            }
        };

        let data_source = match self.get_data_source(&provider.id, data_source_name).await? {
            Some(source) => source,
            None => {
                tracing::info!(
                    provider = provider_name,
                    data_source = data_source_name,
                    "data source not found, creating it"
                );
                self.create_data_source(&provider.id, data_source_name)
                    .await?
            }
        };

        let payload = serde_json::json!({
            "id": provider.id,
            "data_source_id": data_source.id,
            "json_data": document.to_json()?,
        });
        let url = format!(
            "{}/api/v1/providers/custom/{}/datasources/{}/push",
            self.base_url, provider.id, data_source.id
        );
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body: PushResponse = self.decode(response).await?;
        if !body.warnings.is_empty() {
            tracing::warn!(count = body.warnings.len(), "service reported push warnings");
        }
        Ok(PushOutcome {
            warnings: body.warnings,
        })
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, PublisherError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let mut body: ApiErrorBody = response.json().await.unwrap_or_default();
        if body.message.is_empty() {
            body.message = status.to_string();
        }
        Err(PublisherError::Api {
            status: status.as_u16(),
            code: body.code,
            message: body.message,
            details: body.details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_non_http_urls() {
        for url in ["inventory.example.com", "ftp://inventory.example.com", ""] {
            let err = Publisher::new(url, "key").unwrap_err();
            assert!(matches!(err, PublisherError::InvalidBaseUrl { .. }));
        }
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let publisher = Publisher::new("https://inventory.example.com/", "key").unwrap();
        assert_eq!(publisher.base_url, "https://inventory.example.com");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let publisher = Publisher::new("https://inventory.example.com", "super-secret").unwrap();
        let rendered = format!("{publisher:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_provider_template_tokens() {
        assert_eq!(ProviderTemplate::Application.as_str(), "application");
        assert_eq!(
            ProviderTemplate::IdentityProvider.as_str(),
            "identity_provider"
        );
    }

    #[test]
    fn test_value_list_defaults_to_empty() {
        // both element types the client decodes lists of
        let providers: ValueList<Provider> = serde_json::from_str("{}").unwrap();
        assert!(providers.values.is_empty());

        let sources: ValueList<DataSource> = serde_json::from_str("{}").unwrap();
        assert!(sources.values.is_empty());
    }
}
