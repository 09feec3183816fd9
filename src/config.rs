use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use time::UtcOffset;

use crate::scheduling::window::BookingWindow;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub booking: BookingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

/// Rules shared by every booking, rescheduling and availability call.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    /// Minimum lead time for a same-day booking.
    pub buffer_minutes: i32,
    /// Offset of the business timezone that defines "today".
    pub utc_offset_minutes: i32,
    /// Prefix for generated live/family meeting links.
    pub meeting_base_url: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: 30,
            utc_offset_minutes: 0,
            meeting_base_url: "https://meet.mockrise.app".to_string(),
        }
    }
}

impl BookingConfig {
    pub fn window(&self) -> Result<BookingWindow> {
        let offset = UtcOffset::from_whole_seconds(self.utc_offset_minutes * 60)
            .context("BOOKING_UTC_OFFSET_MINUTES is out of range")?;
        Ok(BookingWindow::new(self.buffer_minutes, offset))
    }
}

fn parse_optional<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => Ok(Some(
            val.parse::<T>()
                .with_context(|| format!("Failed to parse {key}"))?,
        )),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let host = parse_optional::<IpAddr>("SERVER_HOST")?
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = parse_optional::<u16>("SERVER_PORT")?.unwrap_or(8000);

        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = parse_optional("DATABASE_MAX_CONNECTIONS")?.or(Some(10));
        let db_min_connections = parse_optional("DATABASE_MIN_CONNECTIONS")?.or(Some(1));

        let environment = env::var("APP_ENVIRONMENT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "MockRise".to_string());

        let defaults = BookingConfig::default();
        let booking = BookingConfig {
            buffer_minutes: parse_optional("BOOKING_BUFFER_MINUTES")?
                .unwrap_or(defaults.buffer_minutes),
            utc_offset_minutes: parse_optional("BOOKING_UTC_OFFSET_MINUTES")?
                .unwrap_or(defaults.utc_offset_minutes),
            meeting_base_url: env::var("MEETING_BASE_URL").unwrap_or(defaults.meeting_base_url),
        };
        if booking.buffer_minutes < 0 {
            anyhow::bail!("BOOKING_BUFFER_MINUTES must not be negative");
        }
        booking.window()?;

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            app: AppConfig {
                name: app_name,
                environment,
            },
            booking,
        })
    }

    /// Configuration for tests and local tooling that never touches the
    /// environment.
    pub fn for_tests() -> Self {
        Config {
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 0,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: None,
                min_connections: None,
            },
            app: AppConfig {
                name: "MockRise".to_string(),
                environment: Environment::Development,
            },
            booking: BookingConfig::default(),
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_defaults_use_a_thirty_minute_buffer_in_utc() {
        let window = BookingConfig::default().window().unwrap();
        assert_eq!(window.buffer_minutes, 30);
        assert_eq!(window.offset, UtcOffset::UTC);
    }

    #[test]
    fn offset_outside_the_valid_range_is_rejected() {
        let booking = BookingConfig {
            utc_offset_minutes: 48 * 60,
            ..BookingConfig::default()
        };
        assert!(booking.window().is_err());
    }

    #[test]
    fn environment_parsing_is_case_insensitive() {
        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert!("qa".parse::<Environment>().is_err());
    }
}
