use log::LevelFilter;
use once_cell::sync::Lazy;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Forced before the logger exists, so rejected values are kept in
/// `warnings` for `main` to report once logging is up.
pub static CONFIG: Lazy<LoadedConfig> = Lazy::new(LoadedConfig::from_env);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_origin: String,
    pub log_level: LevelFilter,
    // 固定シードで役職配布と暗殺者の抽選を再現する
    pub rng_seed: Option<u64>,
    // ゲーム状態 API に役職表を含めるかどうか
    pub show_player_roles: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            cors_origin: "http://localhost:3000".to_string(),
            log_level: LevelFilter::Info,
            rng_seed: None,
            show_player_roles: false,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Invalid values fall back to the default and leave a warning behind.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ServerConfig::default();
        let mut vars = EnvVars {
            lookup,
            warnings: Vec::new(),
        };
        let server = ServerConfig {
            host: vars.parse("AVALON_HOST").unwrap_or(defaults.host),
            port: vars.parse("AVALON_PORT").unwrap_or(defaults.port),
            cors_origin: vars.raw("AVALON_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            log_level: vars.parse("AVALON_LOG_LEVEL").unwrap_or(defaults.log_level),
            rng_seed: vars.parse("AVALON_RNG_SEED"),
            show_player_roles: vars
                .parse("AVALON_DEBUG_SHOW_ROLES")
                .unwrap_or(defaults.show_player_roles),
        };
        Self {
            server,
            warnings: vars.warnings,
        }
    }
}

struct EnvVars<F> {
    lookup: F,
    warnings: Vec<String>,
}

impl<F: Fn(&str) -> Option<String>> EnvVars<F> {
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    fn parse<T: FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = self.raw(key)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.warnings
                    .push(format!("ignoring invalid value for {}: {:?}", key, raw));
                None
            }
        }
    }
}
