use crate::domain::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub tick_interval: Duration,
    pub initial_balance: Decimal,
    /// Fixed RNG seed for reproducible price paths.
    pub simulation_seed: Option<u64>,
    /// Commentary endpoint; the mock provider is used when unset.
    pub commentary_api_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let tick_interval_ms = env_map
            .get("TICK_INTERVAL_MS")
            .map(|s| s.as_str())
            .unwrap_or("3000")
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "TICK_INTERVAL_MS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let initial_balance = env_map
            .get("INITIAL_BALANCE")
            .map(|s| s.as_str())
            .unwrap_or("100000")
            .parse::<Decimal>()
            .ok()
            .filter(|b| b.is_positive())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "INITIAL_BALANCE".to_string(),
                    "must be a positive decimal".to_string(),
                )
            })?;

        let simulation_seed = match env_map.get("SIMULATION_SEED") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "SIMULATION_SEED".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?),
            None => None,
        };

        let commentary_api_url = env_map
            .get("COMMENTARY_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Config {
            port,
            database_path,
            tick_interval: Duration::from_millis(tick_interval_ms),
            initial_balance,
            simulation_seed,
            commentary_api_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.tick_interval, Duration::from_millis(3000));
        assert_eq!(config.initial_balance, Decimal::from(100000));
        assert_eq!(config.simulation_seed, None);
        assert_eq!(config.commentary_api_url, None);
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("TICK_INTERVAL_MS".to_string(), "0".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TICK_INTERVAL_MS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_negative_initial_balance_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("INITIAL_BALANCE".to_string(), "-5".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "INITIAL_BALANCE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_seed() {
        let mut env_map = setup_required_env();
        env_map.insert("SIMULATION_SEED".to_string(), "abc".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "SIMULATION_SEED"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_optional_values() {
        let mut env_map = setup_required_env();
        env_map.insert("SIMULATION_SEED".to_string(), "42".to_string());
        env_map.insert(
            "COMMENTARY_API_URL".to_string(),
            "http://localhost:9000/insight".to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.simulation_seed, Some(42));
        assert_eq!(
            config.commentary_api_url.as_deref(),
            Some("http://localhost:9000/insight")
        );
    }
}
