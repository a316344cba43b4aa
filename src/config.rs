use std::env;
use std::fmt::Display;
use std::num::NonZeroU32;
use std::str::FromStr;

use actix_web::cookie::Key;
use log::{info, warn};

const DEFAULT_IP: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://movies.db";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}='{value}': {reason}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("SECRET_KEY must be at least 64 bytes long")]
    SecretKeyTooShort,
    #[error("TLS_CERT and TLS_KEY must be set together")]
    IncompleteTls,
}

#[derive(Clone, Debug)]
pub struct TlsConfig {
    pub cert_chain: String,
    pub private_key: String,
}

/// Startup configuration, read once from the environment and handed to the
/// server. Nothing reads the environment after this.
#[derive(Clone)]
pub struct Config {
    pub ip: String,
    pub port: u16,
    pub database_url: String,
    pub secret_key: Key,
    pub cookie_secure: bool,
    pub session_ttl_secs: Option<i64>,
    pub tls: Option<TlsConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = match var("SECRET_KEY") {
            Some(raw) => parse_secret_key(&raw)?,
            None => {
                warn!("SECRET_KEY not set, generating an ephemeral key; sessions will not survive a restart");
                Key::generate()
            }
        };

        let tls = match (var("TLS_CERT"), var("TLS_KEY")) {
            (Some(cert_chain), Some(private_key)) => Some(TlsConfig {
                cert_chain,
                private_key,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let session_ttl_secs = match var("SESSION_TTL_SECS") {
            Some(raw) => Some(parse_ttl(&raw)?),
            None => None,
        };

        Ok(Self {
            ip: var_or("IP", DEFAULT_IP),
            port: parse("PORT", &var_or("PORT", DEFAULT_PORT))?,
            database_url: var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            secret_key,
            cookie_secure: parse_bool("COOKIE_SECURE", &var_or("COOKIE_SECURE", "false"))?,
            session_ttl_secs,
            tls,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
            reason: err.to_string(),
        })
}

/// A positive number of seconds; zero would expire the cookie immediately.
fn parse_ttl(value: &str) -> Result<i64, ConfigError> {
    let secs: NonZeroU32 = parse("SESSION_TTL_SECS", value)?;
    Ok(i64::from(secs.get()))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
            reason: "expected 1|0|true|false|yes|no".to_string(),
        }),
    }
}

pub fn parse_secret_key(raw: &str) -> Result<Key, ConfigError> {
    if raw.len() < 64 {
        return Err(ConfigError::SecretKeyTooShort);
    }
    Ok(Key::from(raw.as_bytes()))
}
