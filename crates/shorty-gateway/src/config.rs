use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use shorty_storage::StorageOptions;
use std::fmt::{Display, Formatter};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

pub const PORT_ENV: &str = "PORT";
pub const HOST_ENV: &str = "HOST";
pub const DATABASE_ENV: &str = "DATABASE";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const DEBUG_ENV: &str = "DEBUG";
pub const SHORTENER_LENGTH_ENV: &str = "SHORTENER_LENGTH";
pub const SSL_ENV: &str = "SSL";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_DATABASE: &str = "memory";
pub const DEFAULT_DATA_DIR: &str = ".";
pub const DEFAULT_SHORTENER_LENGTH: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// Process configuration, read from flags, the environment and `.env`.
#[derive(Debug, Clone, Parser)]
#[command(name = "shorty", about = "A small URL shortener")]
pub struct Config {
    #[arg(long, env = PORT_ENV, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Host name used in generated short URLs.
    #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Storage backend: memory, sqlite or bolt.
    #[arg(long, env = DATABASE_ENV, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Directory holding the sqlite and bolt database files.
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Enables the /list endpoint and debug logging.
    #[arg(
        long,
        env = DEBUG_ENV,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    pub debug: bool,

    #[arg(
        long,
        env = SHORTENER_LENGTH_ENV,
        default_value_t = DEFAULT_SHORTENER_LENGTH,
        value_parser = clap::value_parser!(u8).range(4..=32),
    )]
    pub shortener_length: u8,

    /// Advertise https short URLs.
    #[arg(
        long,
        env = SSL_ENV,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = false,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    pub ssl: bool,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Public base of every short URL, e.g. `http://localhost:8080`.
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Joins `path` onto [`Config::base_url`].
    pub fn full_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Address the HTTP server binds to (all interfaces).
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn storage_options(&self) -> StorageOptions {
        StorageOptions::builder().data_dir(self.data_dir.clone()).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("shorty").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--port",
            "9090",
            "--host",
            "sho.rt",
            "--database",
            "sqlite",
            "--data-dir",
            "/var/lib/shorty",
            "--debug",
            "--shortener-length",
            "8",
            "--ssl",
            "--log-format",
            "json",
        ]);

        assert_eq!(config.port, 9090);
        assert_eq!(config.database, "sqlite");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/shorty"));
        assert!(config.debug);
        assert_eq!(config.shortener_length, 8);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.base_url(), "https://sho.rt:9090");
    }

    #[test]
    fn urls_are_derived_from_host_and_port() {
        let config = parse(&["--host", "example.com", "--port", "8081"]);

        assert_eq!(config.base_url(), "http://example.com:8081");
        assert_eq!(config.full_url("/s/abc"), "http://example.com:8081/s/abc");
        assert_eq!(config.listen_addr().port(), 8081);
        assert!(config.listen_addr().ip().is_unspecified());
    }

    #[test]
    fn switches_accept_common_boolean_spellings() {
        for value in ["1", "t", "TRUE", "yes", "on"] {
            let arg = format!("--ssl={value}");
            let config = parse(&[arg.as_str()]);
            assert!(config.ssl, "{value} should enable ssl");
        }
        for value in ["0", "f", "False", "no", "off"] {
            let arg = format!("--ssl={value}");
            let config = parse(&[arg.as_str()]);
            assert!(!config.ssl, "{value} should disable ssl");
        }
        assert!(Config::try_parse_from(["shorty", "--ssl=maybe"]).is_err());
    }

    #[test]
    fn debug_env_accepts_numeric_true() {
        // No other test depends on DEBUG being unset.
        std::env::set_var(DEBUG_ENV, "1");
        let config = Config::try_parse_from(["shorty"]);
        std::env::remove_var(DEBUG_ENV);

        assert!(config.unwrap().debug);
    }

    #[test]
    fn shortener_length_is_range_checked() {
        let args = ["shorty", "--shortener-length", "2"];
        assert!(Config::try_parse_from(args).is_err());

        let args = ["shorty", "--shortener-length", "33"];
        assert!(Config::try_parse_from(args).is_err());
    }

    #[test]
    fn storage_options_use_data_dir() {
        let config = parse(&["--data-dir", "/tmp/shorty"]);

        assert_eq!(
            config.storage_options().sqlite_path(),
            PathBuf::from("/tmp/shorty/urls.db")
        );
    }
}
