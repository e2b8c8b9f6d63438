use anyhow::{anyhow, Context, Result};
use common_auth::{SigningSecret, TokenConfig};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8085;

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[derive(Debug)]
pub struct ServiceConfig {
    pub listen_addr: SocketAddr,
    pub users_file: PathBuf,
    pub cors_origins: Vec<String>,
    pub token: TokenConfig,
    pub secret: SigningSecret,
}

/// Load everything the service needs from the environment. Any error is fatal.
pub fn load_service_config() -> Result<ServiceConfig> {
    load_service_config_from(|key| env::var(key).ok())
}

pub fn load_service_config_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let secret = SigningSecret::from_lookup(&lookup).context("Invalid signing secret")?;
    let token = TokenConfig::from_lookup(&lookup).context("Invalid token settings")?;

    let users_file = lookup("AUTH_USERS_FILE")
        .and_then(|value| normalize_optional(&value))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("AUTH_USERS_FILE must be set"))?;

    let host = lookup("HOST")
        .and_then(|value| normalize_optional(&value))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid HOST '{host}'"))?;
    let port = match lookup("PORT").and_then(|value| normalize_optional(&value)) {
        Some(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("Invalid PORT '{raw}'"))?,
        None => DEFAULT_PORT,
    };

    let cors_origins = lookup("AUTH_CORS_ORIGINS")
        .map(|value| parse_list(&value))
        .filter(|origins| !origins.is_empty())
        .unwrap_or_else(default_cors_origins);

    Ok(ServiceConfig {
        listen_addr: SocketAddr::from((ip, port)),
        users_file,
        cors_origins,
        token,
        secret,
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(|c| c == ',' || c == ';' || c == ' ')
        .filter_map(normalize_optional)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let config = load_service_config_from(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("AUTH_USERS_FILE", "/etc/auth/users.json"),
        ]))
        .expect("config");
        assert_eq!(config.listen_addr.port(), 8085);
        assert_eq!(config.users_file, PathBuf::from("/etc/auth/users.json"));
        assert_eq!(config.cors_origins, default_cors_origins());
        assert_eq!(config.token, TokenConfig::default());
    }

    #[test]
    fn short_secret_aborts_startup() {
        let err = load_service_config_from(lookup_from(&[
            ("JWT_SECRET", "short"),
            ("AUTH_USERS_FILE", "users.json"),
        ]))
        .expect_err("short secret");
        assert!(format!("{err:#}").contains("at least 32 bytes"));
    }

    #[test]
    fn missing_secret_aborts_startup() {
        let err = load_service_config_from(lookup_from(&[("AUTH_USERS_FILE", "users.json")]))
            .expect_err("missing secret");
        assert!(format!("{err:#}").contains("JWT_SECRET"));
    }

    #[test]
    fn parse_list_splits_and_trims() {
        assert_eq!(
            parse_list("https://a.example, https://b.example;;"),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn rejects_bad_port() {
        let err = load_service_config_from(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("AUTH_USERS_FILE", "users.json"),
            ("PORT", "eighty"),
        ]))
        .expect_err("bad port");
        assert!(err.to_string().contains("Invalid PORT"));
    }
}
