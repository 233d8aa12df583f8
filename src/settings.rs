use miette::{Diagnostic, IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub service: Service,
    pub application: Application,
    pub provider: Provider,
    pub input: Input,
}

/// Connection details for the authorization-inventory service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Service {
    /// Base URL of the service API, e.g., https://inventory.example.com
    pub base_url: String,
    /// Bearer token for the service API. Required before anything runs.
    pub api_key: String,
}

/// Identity of the application being modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub name: String,
    pub application_type: String,
    pub description: Option<String>,
}

/// Provider and data-source naming on the remote side.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Provider {
    /// Provider to publish under. Defaults to the application name.
    pub name: String,
    /// Data source within the provider (defaults to "<name> (<type>)")
    pub data_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    /// Directory holding the five csv tables.
    pub csv_dir: PathBuf,
}

impl Default for Application {
    fn default() -> Self {
        Self {
            name: "Custom Application".to_string(),
            application_type: "custom".to_string(),
            description: None,
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("csv_data"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum SettingsError {
    #[error("service.base_url is not configured")]
    #[diagnostic(
        code(orrery::settings::base_url),
        help("set it in the config file or via ORRERY__SERVICE__BASE_URL")
    )]
    MissingBaseUrl,

    #[error("service.api_key is not configured")]
    #[diagnostic(
        code(orrery::settings::api_key),
        help("set it in the config file or via ORRERY__SERVICE__API_KEY")
    )]
    MissingApiKey,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("service.base_url", Service::default().base_url)
            .into_diagnostic()?
            .set_default("service.api_key", Service::default().api_key)
            .into_diagnostic()?
            .set_default("application.name", Application::default().name)
            .into_diagnostic()?
            .set_default(
                "application.application_type",
                Application::default().application_type,
            )
            .into_diagnostic()?
            .set_default("provider.name", Provider::default().name)
            .into_diagnostic()?
            .set_default(
                "input.csv_dir",
                Input::default().csv_dir.to_string_lossy().to_string(),
            )
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: ORRERY__SERVICE__API_KEY=..., etc.
        builder = builder.add_source(config::Environment::with_prefix("ORRERY").separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize the csv directory to be relative to current dir
        if s.input.csv_dir.is_relative() {
            s.input.csv_dir = std::env::current_dir()
                .into_diagnostic()?
                .join(&s.input.csv_dir);
        }

        Ok(s)
    }

    /// Required credentials must be present before any graph work starts.
    pub fn validate(&self) -> std::result::Result<(), SettingsError> {
        if self.service.base_url.trim().is_empty() {
            return Err(SettingsError::MissingBaseUrl);
        }
        if self.service.api_key.trim().is_empty() {
            return Err(SettingsError::MissingApiKey);
        }
        Ok(())
    }

    pub fn provider_name(&self) -> &str {
        if self.provider.name.is_empty() {
            &self.application.name
        } else {
            &self.provider.name
        }
    }

    pub fn data_source_name(&self) -> String {
        if let Some(name) = &self.provider.data_source {
            name.clone()
        } else {
            format!(
                "{} ({})",
                self.application.name, self.application.application_type
            )
        }
    }
}
