//! Runtime configuration knobs.
//!
//! A plain struct built explicitly at each call site (the emulator CLI parses
//! one from its arguments; tests build one by hand with a near-zero processing
//! delay) rather than read from a global — mirroring the reference lineage's
//! `Opts` pattern of passing an explicit options value through rather than
//! reaching for ambient state.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub catalog_path: String,
    /// Minimum simulated delay between observing `CMD_TOKEN` set and dispatch
    /// starting. Real firmware incurs this incidentally; emulation has to ask
    /// for it explicitly to exercise race-sensitive player code (§9).
    pub command_processing_delay: Duration,
    pub echo_timeout: Duration,
    pub connect_timeout: Duration,
    pub default_command_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "storage.googleapis.com".to_string(),
            server_port: 80,
            catalog_path: "catalog.bin".to_string(),
            command_processing_delay: Duration::from_millis(100),
            echo_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(40),
            default_command_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// A config suitable for tests: near-zero processing delay and timeouts
    /// short enough that a hung fetch fails a test quickly instead of hanging
    /// the suite, but long enough not to race legitimate in-process work.
    pub fn for_tests(server_host: impl Into<String>, server_port: u16) -> Self {
        Self {
            server_host: server_host.into(),
            server_port,
            command_processing_delay: Duration::from_millis(1),
            echo_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
            default_command_timeout: Duration::from_secs(2),
            ..Self::default()
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn catalog_url(&self) -> String {
        format!("{}/{}", self.base_url(), self.catalog_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_documented_values() {
        let config = Config::default();
        assert_eq!(config.server_host, "storage.googleapis.com");
        assert_eq!(config.server_port, 80);
        assert_eq!(config.command_processing_delay, Duration::from_millis(100));
    }

    #[test]
    fn catalog_url_joins_base_and_path() {
        let config = Config::for_tests("127.0.0.1", 9000);
        assert_eq!(config.catalog_url(), "http://127.0.0.1:9000/catalog.bin");
    }
}
