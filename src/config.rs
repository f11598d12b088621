use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{config_error, Error};
use crate::progress::{ProgressPolicy, DEFAULT_OFF_ROUTE_THRESHOLD_M};

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub off_route_threshold_m: f64,
    pub sample_interval: Duration,
    pub simulated_step_m: f64,
    pub simulated_jitter_m: f64,
    pub progress_policy: ProgressPolicy,
    pub routes_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: None,
            database_max_connections: 5,
            off_route_threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
            sample_interval: Duration::from_millis(1000),
            simulated_step_m: 10.0,
            simulated_jitter_m: 0.0,
            progress_policy: ProgressPolicy::Follow,
            routes_path: None,
        }
    }
}

impl Config {
    /// Reads `ERUVIFY_*` variables, after loading `.env` if one exists.
    #[tracing::instrument]
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: parse(&lookup, "ERUVIFY_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            database_url: lookup("ERUVIFY_DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: checked(&lookup, "ERUVIFY_DATABASE_MAX_CONNECTIONS", |n: &u32| *n > 0)?
                .unwrap_or(defaults.database_max_connections),
            off_route_threshold_m: checked(&lookup, "ERUVIFY_OFF_ROUTE_THRESHOLD_M", non_negative)?
                .unwrap_or(defaults.off_route_threshold_m),
            sample_interval: checked(&lookup, "ERUVIFY_SAMPLE_INTERVAL_MS", |ms: &u64| *ms > 0)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.sample_interval),
            simulated_step_m: checked(&lookup, "ERUVIFY_SIMULATED_STEP_M", positive)?
                .unwrap_or(defaults.simulated_step_m),
            simulated_jitter_m: checked(&lookup, "ERUVIFY_SIMULATED_JITTER_M", non_negative)?
                .unwrap_or(defaults.simulated_jitter_m),
            progress_policy: parse(&lookup, "ERUVIFY_PROGRESS_POLICY")?
                .unwrap_or(defaults.progress_policy),
            routes_path: lookup("ERUVIFY_ROUTES_PATH").map(PathBuf::from),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &str) -> Result<Option<T>, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config_error(key)),
        None => Ok(None),
    }
}

/// Like `parse`, but also rejects values failing `valid`.
fn checked<F, T>(lookup: &F, key: &str, valid: fn(&T) -> bool) -> Result<Option<T>, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match parse(lookup, key)? {
        Some(value) if !valid(&value) => Err(config_error(key)),
        value => Ok(value),
    }
}

fn positive(value: &f64) -> bool {
    value.is_finite() && *value > 0.0
}

fn non_negative(value: &f64) -> bool {
    value.is_finite() && *value >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();

        assert_eq!(config.off_route_threshold_m, 50.0);
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(config.progress_policy, ProgressPolicy::Follow);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn overrides() {
        let config = config(&[
            ("ERUVIFY_OFF_ROUTE_THRESHOLD_M", "75.5"),
            ("ERUVIFY_SAMPLE_INTERVAL_MS", "3000"),
            ("ERUVIFY_PROGRESS_POLICY", "ratchet"),
            ("ERUVIFY_BIND_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();

        assert_eq!(config.off_route_threshold_m, 75.5);
        assert_eq!(config.sample_interval, Duration::from_secs(3));
        assert_eq!(config.progress_policy, ProgressPolicy::Ratchet);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn invalid_value() {
        let err = config(&[("ERUVIFY_SAMPLE_INTERVAL_MS", "soon")]).unwrap_err();

        assert_eq!(err.code, 6);
        assert!(err.message.contains("ERUVIFY_SAMPLE_INTERVAL_MS"));
    }

    #[test]
    fn out_of_range_values() {
        let rejected = [
            ("ERUVIFY_SAMPLE_INTERVAL_MS", "0"),
            ("ERUVIFY_SIMULATED_STEP_M", "0"),
            ("ERUVIFY_SIMULATED_STEP_M", "-5"),
            ("ERUVIFY_SIMULATED_STEP_M", "NaN"),
            ("ERUVIFY_OFF_ROUTE_THRESHOLD_M", "-1"),
            ("ERUVIFY_OFF_ROUTE_THRESHOLD_M", "NaN"),
            ("ERUVIFY_OFF_ROUTE_THRESHOLD_M", "inf"),
            ("ERUVIFY_SIMULATED_JITTER_M", "-0.5"),
            ("ERUVIFY_SIMULATED_JITTER_M", "NaN"),
            ("ERUVIFY_DATABASE_MAX_CONNECTIONS", "0"),
        ];

        for (key, value) in rejected {
            let err = config(&[(key, value)]).unwrap_err();
            assert_eq!(err.code, 6, "{}={}", key, value);
            assert!(err.message.contains(key));
        }

        let config = config(&[
            ("ERUVIFY_OFF_ROUTE_THRESHOLD_M", "0"),
            ("ERUVIFY_SIMULATED_JITTER_M", "0"),
            ("ERUVIFY_SIMULATED_STEP_M", "0.5"),
        ])
        .unwrap();
        assert_eq!(config.simulated_step_m, 0.5);
    }
}
