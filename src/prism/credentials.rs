//! Host and credential resolution from multiple sources

use dialoguer::{theme::ColorfulTheme, Input, Password};
use log::debug;
use std::fmt;

use crate::config::credentials;
use crate::error::{PrismError, Result};

/// Host, username and password for one appliance
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Which appliance is being logged into, and where its settings live
#[derive(Debug, Clone, Copy)]
pub struct CredentialSource {
    /// Human-readable target, used in prompts and errors
    pub label: &'static str,
    /// Environment variables for host, username and password
    pub env_vars: [&'static str; 3],
    /// Command-line flags for host, username and password
    pub flags: [&'static str; 3],
}

impl CredentialSource {
    pub const PRISM_CENTRAL: CredentialSource = CredentialSource {
        label: "Prism Central",
        env_vars: credentials::PRISM_ENV_VARS,
        flags: ["--host", "--username", "--password"],
    };

    pub const MOVE: CredentialSource = CredentialSource {
        label: "Move",
        env_vars: credentials::MOVE_ENV_VARS,
        flags: ["--move-host", "--move-username", "--move-password"],
    };
}

/// Values given on the command line, if any
#[derive(Debug, Clone, Default)]
pub struct CliCredentials<'a> {
    pub host: Option<&'a str>,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Credential resolution with fallback logic
pub struct CredentialResolver {
    batch_mode: bool,
}

impl CredentialResolver {
    pub fn new(batch_mode: bool) -> Self {
        Self { batch_mode }
    }

    /// Resolve each value from:
    /// 1. CLI argument (if provided)
    /// 2. Environment variable
    /// 3. Interactive prompt (not in batch mode)
    pub fn resolve(&self, source: CredentialSource, cli: &CliCredentials) -> Result<Credentials> {
        self.resolve_with(source, cli, |name| std::env::var(name).ok())
    }

    fn resolve_with<F>(
        &self,
        source: CredentialSource,
        cli: &CliCredentials,
        lookup: F,
    ) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let [host_var, user_var, pass_var] = source.env_vars;
        let [host_flag, user_flag, pass_flag] = source.flags;

        let host = match Self::from_cli_or_env(cli.host, host_var, &lookup) {
            Some(host) => normalize_host(&host),
            None if self.batch_mode => {
                return Err(PrismError::HostNotFound(missing_message(
                    source, "host", host_flag, host_var,
                )))
            }
            None => normalize_host(&prompt_text(&format!("{} host", source.label))?),
        };
        if host.is_empty() {
            return Err(PrismError::HostNotFound(format!(
                "{} host must not be empty",
                source.label
            )));
        }

        let username = match Self::from_cli_or_env(cli.username, user_var, &lookup) {
            Some(username) => username,
            None if self.batch_mode => {
                return Err(PrismError::Credentials(missing_message(
                    source,
                    "username",
                    user_flag,
                    user_var,
                )))
            }
            None => prompt_text(&format!("{} username", source.label))?,
        };

        let password = match Self::from_cli_or_env(cli.password, pass_var, &lookup) {
            Some(password) => password,
            None if self.batch_mode => {
                return Err(PrismError::Credentials(missing_message(
                    source,
                    "password",
                    pass_flag,
                    pass_var,
                )))
            }
            None => prompt_password(&format!("{} password for {}", source.label, username))?,
        };

        Ok(Credentials {
            host,
            username,
            password,
        })
    }

    fn from_cli_or_env<F>(cli_value: Option<&str>, env_var: &str, lookup: &F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = cli_value.filter(|v| !v.is_empty()) {
            debug!("Using value from CLI argument for {}", env_var);
            return Some(value.to_string());
        }
        match lookup(env_var).filter(|v| !v.is_empty()) {
            Some(value) => {
                debug!("Using value from {} environment variable", env_var);
                Some(value)
            }
            None => None,
        }
    }
}

/// Strip scheme, path and surrounding whitespace from a host argument
pub fn normalize_host(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

fn missing_message(source: CredentialSource, what: &str, flag: &str, env_var: &str) -> String {
    format!(
        "No {} {} provided. Use {} or set {} (prompts are disabled in batch mode)",
        source.label, what, flag, env_var
    )
}

pub(crate) fn prompt_text(prompt: &str) -> Result<String> {
    Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact_text()
        .map(|v| v.trim().to_string())
        .map_err(|e| PrismError::Credentials(format!("Failed to read {}: {}", prompt, e)))
}

pub(crate) fn prompt_password(prompt: &str) -> Result<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()
        .map_err(|e| PrismError::Credentials(format!("Failed to read {}: {}", prompt, e)))
}
