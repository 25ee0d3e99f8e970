use std::{env, fmt::Display, str::FromStr};

use log::*;
use qrmenu_common::{
    helpers::{parse_boolean_flag, parse_optional},
    Secret,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_QRM_HOST: &str = "127.0.0.1";
const DEFAULT_QRM_PORT: u16 = 8470;
const DEFAULT_BOARD_ORDER_LIMIT: u32 = 200;
const DEFAULT_CHANGE_FEED_CAPACITY: usize = 256;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 32;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const SESSION_SECRET_LENGTH: usize = 48;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Marks the active-order cookie as `Secure`. Only switch this off for local development over plain HTTP.
    pub secure_cookies: bool,
    /// The maximum number of orders shown on an owner's order board
    pub board_order_limit: u32,
    /// How many row changes the change feed buffers before slow subscribers start lagging
    pub change_feed_capacity: usize,
    /// The buffer size of each order event hook channel
    pub event_buffer_size: usize,
    pub db_max_connections: u32,
    /// Apply any pending database migrations on startup
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_QRM_HOST.to_string(),
            port: DEFAULT_QRM_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            secure_cookies: true,
            board_order_limit: DEFAULT_BOARD_ORDER_LIMIT,
            change_feed_capacity: DEFAULT_CHANGE_FEED_CAPACITY,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("QRM_HOST").ok().unwrap_or_else(|| DEFAULT_QRM_HOST.into());
        let port = env_or_default("QRM_PORT", DEFAULT_QRM_PORT);
        let database_url = env::var("QRM_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ QRM_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration. {e}. Reverting to the default configuration.");
            AuthConfig::default()
        });
        let secure_cookies = parse_boolean_flag(env::var("QRM_SECURE_COOKIES").ok(), true);
        if !secure_cookies {
            warn!("🪛️ The active-order cookie will be sent over plain HTTP. Do not run production like this.");
        }
        let board_order_limit = env_or_default("QRM_BOARD_ORDER_LIMIT", DEFAULT_BOARD_ORDER_LIMIT);
        let change_feed_capacity = env_or_default("QRM_CHANGE_FEED_CAPACITY", DEFAULT_CHANGE_FEED_CAPACITY);
        let event_buffer_size = env_or_default("QRM_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let db_max_connections = env_or_default("QRM_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let run_migrations = parse_boolean_flag(env::var("QRM_RUN_MIGRATIONS").ok(), true);
        Self {
            host,
            port,
            database_url,
            auth,
            secure_cookies,
            board_order_limit,
            change_feed_capacity,
            event_buffer_size,
            db_max_connections,
            run_migrations,
        }
    }
}

/// Reads `name` from the environment. Missing values quietly give `default`; invalid or zero values log a warning
/// and give `default`.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + Default + PartialEq,
    T::Err: Display,
{
    match parse_optional::<T>(env::var(name).ok()) {
        Ok(Some(v)) if v == T::default() => {
            warn!("🪛️ {name} cannot be zero. Using the default, {default}, instead.");
            default
        },
        Ok(Some(v)) => v,
        Ok(None) => default,
        Err(e) => {
            warn!("🪛️ Invalid configuration value for {name}. {e} Using the default, {default}, instead.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify owner access tokens
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Every owner token \
             will stop working when the server restarts. DO NOT operate on production like this. Set QRM_JWT_SECRET \
             instead. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(SESSION_SECRET_LENGTH).map(char::from).collect();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self { jwt_secret: Secret::new(secret.into()) }
    }

    pub fn try_from_env() -> Result<Self, String> {
        let secret = env::var("QRM_JWT_SECRET").map_err(|e| format!("{e} [QRM_JWT_SECRET]"))?;
        if secret.trim().len() < 32 {
            return Err("QRM_JWT_SECRET must be at least 32 characters long".to_string());
        }
        Ok(Self::new(secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that handlers need. It holds no secrets and is shared with every route.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub secure_cookies: bool,
    pub board_order_limit: u32,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { secure_cookies: true, board_order_limit: DEFAULT_BOARD_ORDER_LIMIT }
    }
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { secure_cookies: config.secure_cookies, board_order_limit: config.board_order_limit }
    }
}
