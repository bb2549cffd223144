use persistence::db::DatabaseConfig;
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub rooms: RoomsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-address quota for room creation. Zero disables rate limiting.
    #[serde(default = "default_create_room_limit")]
    pub create_room_per_minute: u32,

    /// Per-address quota for joins and state transitions; deliberately
    /// higher than the creation quota.
    #[serde(default = "default_action_limit")]
    pub actions_per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomsConfig {
    /// Base URL printed into invite links.
    #[serde(default = "default_invite_base_url")]
    pub invite_base_url: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_create_room_limit() -> u32 {
    10
}
fn default_action_limit() -> u32 {
    120
}
fn default_invite_base_url() -> String {
    "https://partyroom.example.com".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PR__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PR").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .expect("Invalid server host/port configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [server]
        [database]
        url = "postgres://localhost/party_room"
        [logging]
        [security]
        [rooms]
    "#;

    #[test]
    fn test_defaults_fill_in() {
        let cfg = config_from(MINIMAL);
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.request_timeout_secs, 30);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.security.create_room_per_minute, 10);
        assert_eq!(cfg.security.actions_per_minute, 120);
        assert!(cfg.security.cors_origins.is_empty());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = config_from(MINIMAL);
        assert_eq!(cfg.socket_addr().port(), 8080);
    }

    #[test]
    fn test_overrides_win() {
        let cfg = config_from(
            r#"
            [server]
            port = 9000
            [database]
            url = "postgres://localhost/party_room"
            [logging]
            format = "pretty"
            [security]
            create_room_per_minute = 3
            [rooms]
            invite_base_url = "https://rooms.local"
        "#,
        );
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.logging.format, "pretty");
        assert_eq!(cfg.security.create_room_per_minute, 3);
        assert_eq!(cfg.rooms.invite_base_url, "https://rooms.local");
    }
}
