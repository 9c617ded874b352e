use std::path::PathBuf;
use std::time::Duration;

/// Relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Interface the HTTP server binds to
    pub bind_addr: String,

    /// HTTP server port
    pub port: u16,

    /// Root folder holding one sub-folder of event files per experiment
    pub log_dir: PathBuf,

    /// Base URL of the TensorBoard instance serving `log_dir`
    pub tensorboard_url: String,

    /// Timeout for each proxied TensorBoard request
    pub proxy_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8889,
            log_dir: PathBuf::from("/tmp/tensorboard"),
            tensorboard_url: "http://localhost:8888".to_string(),
            proxy_timeout: Duration::from_secs(1),
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by `TB_RELAY_*` environment variables.
    /// Values that fail to parse keep their default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("TB_RELAY_BIND_ADDR") {
            config.bind_addr = addr;
        }

        if let Some(port) = lookup("TB_RELAY_PORT") {
            if let Ok(p) = port.parse() {
                config.port = p;
            }
        }

        if let Some(dir) = lookup("TB_RELAY_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }

        if let Some(url) = lookup("TB_RELAY_TENSORBOARD_URL") {
            config.tensorboard_url = url.trim_end_matches('/').to_string();
        }

        if let Some(ms) = lookup("TB_RELAY_PROXY_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.proxy_timeout = Duration::from_millis(ms);
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = RelayConfig::from_lookup(|_| None);
        assert_eq!(config.bind_address(), "0.0.0.0:8889");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/tensorboard"));
        assert_eq!(config.tensorboard_url, "http://localhost:8888");
        assert_eq!(config.proxy_timeout, Duration::from_secs(1));
    }

    #[test]
    fn overrides_and_bad_values() {
        let env: HashMap<&str, &str> = [
            ("TB_RELAY_PORT", "9000"),
            ("TB_RELAY_LOG_DIR", "/data/tb"),
            ("TB_RELAY_TENSORBOARD_URL", "http://tb:6006/"),
            ("TB_RELAY_PROXY_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let config = RelayConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_dir, PathBuf::from("/data/tb"));
        assert_eq!(config.tensorboard_url, "http://tb:6006");
        assert_eq!(config.proxy_timeout, Duration::from_secs(1));
    }
}
