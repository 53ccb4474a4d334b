use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use stockhold_carts::DEFAULT_HOLD_MINUTES;

/// Server settings, read from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `BIND_ADDR`: listen address for the HTTP server.
    pub bind_addr: String,
    /// `HOLD_DURATION_MINS`: how long a cart hold keeps stock reserved.
    pub hold_duration: chrono::Duration,
    /// `SWEEP_INTERVAL_SECS`: cadence of the expiry sweeper.
    pub sweep_interval: Duration,
    /// `LOCK_WAIT_MS`: bound on waiting for a stock row lock; 0 waits forever.
    pub lock_wait: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            hold_duration: chrono::Duration::minutes(DEFAULT_HOLD_MINUTES),
            sweep_interval: Duration::from_secs(30),
            lock_wait: Some(Duration::from_millis(5_000)),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Testable core of `from_env`. Unset variables fall back to defaults
    /// quietly; unparseable or out-of-range values fall back with a warning.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = get("BIND_ADDR").unwrap_or(defaults.bind_addr);

        let mut hold_mins = parsed(&get, "HOLD_DURATION_MINS", DEFAULT_HOLD_MINUTES);
        if hold_mins < 0 {
            warn!("HOLD_DURATION_MINS cannot be negative; using default");
            hold_mins = DEFAULT_HOLD_MINUTES;
        }

        let mut sweep_secs: u64 = parsed(&get, "SWEEP_INTERVAL_SECS", 30);
        if sweep_secs == 0 {
            warn!("SWEEP_INTERVAL_SECS cannot be zero; using default");
            sweep_secs = 30;
        }

        let lock_wait_ms: u64 = parsed(&get, "LOCK_WAIT_MS", 5_000);

        Self {
            bind_addr,
            hold_duration: chrono::Duration::minutes(hold_mins),
            sweep_interval: Duration::from_secs(sweep_secs),
            lock_wait: (lock_wait_ms > 0).then(|| Duration::from_millis(lock_wait_ms)),
        }
    }
}

fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> T {
    match get(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "unparseable value; using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        move |key| map.get(key).map(|value| value.to_string())
    }

    #[test]
    fn absent_vars_use_defaults() {
        let config = AppConfig::from_vars(|_| None);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn each_var_is_read() {
        let config = AppConfig::from_vars(vars(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("HOLD_DURATION_MINS", "5"),
            ("SWEEP_INTERVAL_SECS", "7"),
            ("LOCK_WAIT_MS", "250"),
        ]));

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.hold_duration, chrono::Duration::minutes(5));
        assert_eq!(config.sweep_interval, Duration::from_secs(7));
        assert_eq!(config.lock_wait, Some(Duration::from_millis(250)));
    }

    #[test]
    fn zero_lock_wait_means_wait_forever() {
        let config = AppConfig::from_vars(vars(&[("LOCK_WAIT_MS", "0")]));
        assert_eq!(config.lock_wait, None);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = AppConfig::from_vars(vars(&[
            ("HOLD_DURATION_MINS", "soon"),
            ("SWEEP_INTERVAL_SECS", "-3"),
            ("LOCK_WAIT_MS", "a lot"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn negative_hold_falls_back() {
        let config = AppConfig::from_vars(vars(&[("HOLD_DURATION_MINS", "-10")]));
        assert_eq!(config.hold_duration, AppConfig::default().hold_duration);
    }
}
