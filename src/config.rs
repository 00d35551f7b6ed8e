use crate::secret_string::SecretString;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::{env, fs, path::Path};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub webserver: Webserver,
    #[serde(default)]
    pub kubernetes: Kubernetes,
    #[serde(default)]
    pub auth: Option<Auth>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Webserver {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Kubernetes {
    /// Namespace the workloads to redeploy live in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Workloads opt in to auto-redeploy by carrying this label key; only the
    /// key's presence is checked, never its value.
    #[serde(rename = "autoDeployLabel", default = "default_auto_deploy_label")]
    pub auto_deploy_label: String,
}

impl Default for Kubernetes {
    fn default() -> Self {
        Kubernetes {
            namespace: default_namespace(),
            auto_deploy_label: default_auto_deploy_label(),
        }
    }
}

/// Optional shared-secret gate on the webhook endpoint. When absent, the
/// endpoint is open.
#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    #[serde(rename = "apiKey")]
    pub api_key: SecretString,
    /// Query parameter expected to hold the API key.
    #[serde(rename = "apiKeyParamName", default = "default_api_key_param_name")]
    pub api_key_param_name: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_auto_deploy_label() -> String {
    "kube-autoredeploy/enabled".to_string()
}

fn default_api_key_param_name() -> String {
    "apikey".to_string()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    info!("Loading config from file {}", path.as_ref().display());
    let yaml_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let expanded = expand_env_vars(&yaml_str)?;

    let config = serde_yaml_ng::from_str(&expanded)
        .context("Failed to parse YAML config after environment variable expansion")?;

    Ok(config)
}

/// Replaces `${VAR}` placeholders with environment variables values.
/// Returns an error if any env var is missing or regex fails.
fn expand_env_vars(input: &str) -> Result<String> {
    let re =
        Regex::new(r"\$\{([^}]+)}").context("Invalid regex pattern for env var substitution")?;

    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        env::var(var_name).unwrap_or_else(|_| panic!("Missing environment variable: {}", var_name))
    });

    Ok(result.into_owned())
}
