//! Configuration loader and validator for the article notifier.
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration, built once at startup and handed to each component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub notion: Notion,
    pub teams: Teams,
}

/// App-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    /// Dump raw responses and the picked article as YAML.
    pub debug: bool,
    pub on_empty: EmptyResultPolicy,
}

/// Notion API settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notion {
    pub token: String,
    pub version: String,
    pub database_id: String,
    /// Property id of the "Published" checkbox, sent along with the update when set.
    pub published_property_id: Option<String>,
}

/// Teams incoming webhook settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teams {
    pub webhook_url: String,
}

/// What to do when the query matches no article.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyResultPolicy {
    /// Stop without sending anything.
    #[default]
    Skip,
    /// Send the "no articles" card, then stop.
    Notify,
}

impl FromStr for EmptyResultPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "skip" => Ok(EmptyResultPolicy::Skip),
            "notify" => Ok(EmptyResultPolicy::Notify),
            _ => Err(ConfigError::Invalid(
                "EMPTY_RESULT_POLICY must be one of: skip, notify",
            )),
        }
    }
}

/// Load configuration from an env file merged with the process environment.
/// - If `path` is None, uses `.env` in the current working directory.
/// - A missing file is an error.
/// - Variables already set in the process environment win over the file.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new(".env"));
    let mut file_vars = HashMap::new();
    for item in dotenvy::from_path_iter(path)? {
        let (key, value) = item?;
        file_vars.insert(key, value);
    }
    from_lookup(|key| {
        std::env::var(key)
            .ok()
            .or_else(|| file_vars.get(key).cloned())
    })
}

/// Build and validate a configuration from a variable lookup.
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

    let cfg = Config {
        app: App {
            debug: lookup("DEBUG").as_deref() == Some("true"),
            on_empty: lookup("EMPTY_RESULT_POLICY")
                .as_deref()
                .unwrap_or_default()
                .parse()?,
        },
        notion: Notion {
            token: required("NOTION_API_TOKEN")?,
            version: lookup("NOTION_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            database_id: required("NOTION_DB_ID")?,
            published_property_id: lookup("NOTION_PUBLISHED_CHECKBOX_ID")
                .filter(|v| !v.trim().is_empty()),
        },
        teams: Teams {
            webhook_url: required("TEAMS_WEBHOOK_URL")?,
        },
    };
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.notion.token.trim().is_empty() {
        return Err(ConfigError::Invalid("NOTION_API_TOKEN must be non-empty"));
    }
    if cfg.notion.database_id.trim().is_empty() {
        return Err(ConfigError::Invalid("NOTION_DB_ID must be non-empty"));
    }
    if cfg.teams.webhook_url.trim().is_empty() {
        return Err(ConfigError::Invalid("TEAMS_WEBHOOK_URL must be non-empty"));
    }
    if reqwest::Url::parse(&cfg.teams.webhook_url).is_err() {
        return Err(ConfigError::Invalid("TEAMS_WEBHOOK_URL must be a valid URL"));
    }
    Ok(())
}

/// Example `.env` content.
pub fn example() -> &'static str {
    r#"NOTION_API_TOKEN="secret_YOUR_NOTION_INTEGRATION_TOKEN"
NOTION_DB_ID="NOTION_ARTICLE_DATABASE_ID"
NOTION_PUBLISHED_CHECKBOX_ID="NOTION_PUBLISHED_PROPERTY_ID"
TEAMS_WEBHOOK_URL="https://example.webhook.office.com/webhookb2/YOUR_WEBHOOK"
DEBUG="false"
EMPTY_RESULT_POLICY="skip"
"#
}
