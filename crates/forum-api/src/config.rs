use serde::Deserialize;

/// Deployment environment, read from `ENV`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Runtime configuration, one field per environment variable
/// (`database_url` is read from `DATABASE_URL` and so on)
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    /// PostgreSQL URL; when unset topics are kept in memory
    pub database_url: Option<String>,
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated list of origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    /// Maximum number of listing pages kept in the response cache
    #[serde(default = "default_listing_cache_capacity")]
    pub listing_cache_capacity: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> String {
    "http://localhost:8080".to_string()
}

const fn default_db_max_connections() -> u32 {
    10
}

const fn default_listing_cache_capacity() -> usize {
    256
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            env: Environment::default(),
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            db_max_connections: default_db_max_connections(),
            listing_cache_capacity: default_listing_cache_capacity(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
