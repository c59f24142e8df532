/// Configuration management for the API server
///
/// Configuration is layered with the `config` crate, later sources winning:
///
/// 1. `configs/default.yaml` (optional)
/// 2. `configs/<APP_ENV>.yaml` (optional, `APP_ENV` defaults to `dev`)
/// 3. Environment variables prefixed `DEEPRESEARCH__`, nested with `__`
///    (e.g. `DEEPRESEARCH__SERVER__PORT=9000`,
///    `DEEPRESEARCH__SERVER__CORS_ORIGINS=https://a.example,https://b.example`)
/// 4. `DATABASE_URL` and `JWT_SECRET`, if set
///
/// A `.env` file is loaded into the environment first when present.
///
/// # Example
///
/// ```no_run
/// use deepresearch_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use deepresearch_shared::db::pool::PoolConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::env;

/// Minimum accepted length of the token signing secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,

    /// Declared for deployments that set it; nothing connects to Redis yet
    pub redis: RedisConfig,

    /// Declared for deployments that set it; no gRPC listener is started
    pub grpc: GrpcConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any origin
    pub cors_origins: Vec<String>,

    /// Enables HSTS and other production-only headers
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            production: false,
        }
    }
}

/// PostgreSQL connection and pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; when set, the discrete fields below are ignored
    pub service_uri: Option<String>,

    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub sslmode: String,

    /// Upper bound on open connections
    pub max_open_conns: u32,

    /// Connections kept open while idle
    pub max_idle_conns: u32,

    /// Maximum connection lifetime, in minutes
    pub conn_max_lifetime: u64,

    /// How long a request waits for a connection
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            service_uri: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "deepresearch".to_string(),
            sslmode: "disable".to_string(),
            max_open_conns: 10,
            max_idle_conns: 2,
            conn_max_lifetime: 30,
            connect_timeout_seconds: 30,
        }
    }
}

/// Everything but RFC 3986 unreserved characters is escaped in userinfo
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

fn encode_userinfo(raw: &str) -> String {
    utf8_percent_encode(raw, USERINFO).to_string()
}

impl DatabaseConfig {
    /// Connection URL, either `service_uri` or one built from the parts
    pub fn url(&self) -> String {
        if let Some(uri) = self.service_uri.as_deref().filter(|u| !u.trim().is_empty()) {
            return uri.to_string();
        }

        let credentials = if self.password.is_empty() {
            encode_userinfo(&self.user)
        } else {
            format!(
                "{}:{}",
                encode_userinfo(&self.user),
                encode_userinfo(&self.password)
            )
        };

        format!(
            "postgres://{}@{}:{}/{}?sslmode={}",
            credentials, self.host, self.port, self.dbname, self.sslmode
        )
    }

    /// Pool settings derived from this section
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.url(),
            max_connections: self.max_open_conns,
            min_connections: self.max_idle_conns,
            acquire_timeout_seconds: self.connect_timeout_seconds,
            max_lifetime_seconds: Some(self.conn_max_lifetime.saturating_mul(60)),
            ..PoolConfig::default()
        }
    }
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HS256 signing secret, at least 32 characters.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in hours
    pub expiry_hours: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiry_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub addr: String,
    pub password: String,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:6379".to_string(),
            password: String::new(),
            db: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
        }
    }
}

impl Config {
    /// Loads configuration from `configs/`, the environment and `.env`
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or the result fails
    /// [`Config::validate`].
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::from_builder(Self::builder("configs", &app_env))
    }

    /// File and environment layers for `dir` and `app_env`
    pub fn builder(dir: &str, app_env: &str) -> ConfigBuilder<DefaultState> {
        config::Config::builder()
            .add_source(File::with_name(&format!("{dir}/default")).required(false))
            .add_source(File::with_name(&format!("{dir}/{app_env}")).required(false))
            .add_source(
                Environment::with_prefix("DEEPRESEARCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
    }

    /// Applies the legacy overrides, deserializes and validates
    pub fn from_builder(mut builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        if let Ok(url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.service_uri", url)?;
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            builder = builder.set_override("jwt.secret", secret)?;
        }

        let config: Config = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the server cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.secret.is_empty() {
            anyhow::bail!("jwt.secret is required (set JWT_SECRET or DEEPRESEARCH__JWT__SECRET)");
        }
        if self.jwt.secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("jwt.secret must be at least {MIN_JWT_SECRET_LEN} characters long");
        }
        if self.jwt.expiry_hours <= 0 {
            anyhow::bail!("jwt.expiry_hours must be positive");
        }
        if self.database.max_open_conns == 0 {
            anyhow::bail!("database.max_open_conns must be at least 1");
        }
        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.server.cors_origins.iter().any(|o| o.trim() == "*")
    }
}
