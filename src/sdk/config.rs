use crate::sdk::routing::Coord;
use std::{env, fmt::Display, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};
use thiserror::Error;

pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_MAX_POINTS: usize = 5;
pub const DEFAULT_TRIP_INTERVAL_MS: u64 = 3000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("{key} must be greater than zero")]
    Zero { key: String },
}

/// Which backing service resolves routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RoutingMode {
    /// Public OSRM-compatible directions service.
    #[default]
    Osrm,
    /// The project backend's `/api/paths/calculate` endpoint.
    Custom,
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osrm" => Ok(RoutingMode::Osrm),
            "custom" => Ok(RoutingMode::Custom),
            other => Err(format!("unknown routing mode \"{other}\" (expected osrm or custom)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub routing_mode: RoutingMode,
    pub osrm_url: String,
    pub backend_url: String,
    pub nominatim_url: String,
    pub user_agent: String,
    pub requests_per_second: NonZeroU32,
    pub http_timeout: Duration,
    pub max_points: usize,
    pub trip_interval: Duration,
    pub campus_destination: Option<Coord>,
    pub session_file: PathBuf,
    pub geo_cache_file: PathBuf,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            routing_mode: RoutingMode::Osrm,
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: default_user_agent(),
            requests_per_second: NonZeroU32::MIN,
            http_timeout: Duration::from_secs(15),
            max_points: DEFAULT_MAX_POINTS,
            trip_interval: Duration::from_millis(DEFAULT_TRIP_INTERVAL_MS),
            campus_destination: None,
            session_file: PathBuf::from("session.json"),
            geo_cache_file: PathBuf::from("geo_cache.json"),
        }
    }
}

impl TransportConfig {
    /// Reads the `CT_*` environment variables, keeping defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let requests_per_second = NonZeroU32::new(parse_or(
            &lookup,
            "CT_REQUESTS_PER_SECOND",
            defaults.requests_per_second.get(),
        )?)
        .ok_or_else(|| zero("CT_REQUESTS_PER_SECOND"))?;

        let max_points = parse_or(&lookup, "CT_MAX_POINTS", defaults.max_points)?;
        if max_points == 0 {
            return Err(zero("CT_MAX_POINTS"));
        }

        let interval_ms = parse_or(&lookup, "CT_TRIP_INTERVAL_MS", DEFAULT_TRIP_INTERVAL_MS)?;
        if interval_ms == 0 {
            return Err(zero("CT_TRIP_INTERVAL_MS"));
        }

        let campus_destination = match lookup("CT_CAMPUS_DESTINATION") {
            Some(raw) if !raw.trim().is_empty() => Some(parse_coord(&raw).map_err(|message| {
                ConfigError::InvalidValue {
                    key: "CT_CAMPUS_DESTINATION".to_string(),
                    message,
                }
            })?),
            _ => None,
        };

        Ok(Self {
            routing_mode: parse_or(&lookup, "CT_ROUTING_MODE", defaults.routing_mode)?,
            osrm_url: lookup("CT_OSRM_URL").unwrap_or(defaults.osrm_url),
            backend_url: lookup("CT_BACKEND_URL").unwrap_or(defaults.backend_url),
            nominatim_url: lookup("CT_NOMINATIM_URL").unwrap_or(defaults.nominatim_url),
            user_agent: lookup("CT_USER_AGENT").unwrap_or(defaults.user_agent),
            requests_per_second,
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CT_HTTP_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            max_points,
            trip_interval: Duration::from_millis(interval_ms),
            campus_destination,
            session_file: lookup("CT_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            geo_cache_file: lookup("CT_GEO_CACHE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.geo_cache_file),
        })
    }
}

fn default_user_agent() -> String {
    format!("campus-transport/{}", env!("CARGO_PKG_VERSION"))
}

fn zero(key: &str) -> ConfigError {
    ConfigError::Zero {
        key: key.to_string(),
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| {
            log::warn!("Invalid {} value: {}", key, e);
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            }
        }),
        None => Ok(default),
    }
}

/// Parses `"lon,lat"` into a coordinate.
pub fn parse_coord(raw: &str) -> Result<Coord, String> {
    let (lon, lat) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lon,lat\", got \"{raw}\""))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude \"{}\": {e}", lon.trim()))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude \"{}\": {e}", lat.trim()))?;
    Ok((lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = TransportConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.routing_mode, RoutingMode::Osrm);
        assert_eq!(config.osrm_url, DEFAULT_OSRM_URL);
        assert_eq!(config.max_points, 5);
        assert_eq!(config.trip_interval, Duration::from_millis(3000));
        assert!(config.campus_destination.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = TransportConfig::from_lookup(lookup_from(&[
            ("CT_ROUTING_MODE", "Custom"),
            ("CT_BACKEND_URL", "http://10.0.0.2:8000"),
            ("CT_TRIP_INTERVAL_MS", "300"),
            ("CT_CAMPUS_DESTINATION", "-64.3051, -33.1208"),
        ]))
        .unwrap();
        assert_eq!(config.routing_mode, RoutingMode::Custom);
        assert_eq!(config.backend_url, "http://10.0.0.2:8000");
        assert_eq!(config.trip_interval, Duration::from_millis(300));
        assert_eq!(config.campus_destination, Some((-64.3051, -33.1208)));
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(matches!(
            TransportConfig::from_lookup(lookup_from(&[("CT_MAX_POINTS", "0")])),
            Err(ConfigError::Zero { .. })
        ));
        assert!(matches!(
            TransportConfig::from_lookup(lookup_from(&[("CT_ROUTING_MODE", "graphhopper")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            TransportConfig::from_lookup(lookup_from(&[("CT_CAMPUS_DESTINATION", "-64.3")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn parses_negative_coordinates() {
        assert_eq!(parse_coord("-64.349,-33.123"), Ok((-64.349, -33.123)));
        assert!(parse_coord("abc,1").is_err());
    }
}
