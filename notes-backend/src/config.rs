use std::env;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const BIND_ADDRESS: &str = "BIND_ADDRESS";
    /// Path to the SQLite file, or ":memory:" for a throwaway database.
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const DB_POOL_SIZE: &str = "DB_POOL_SIZE";
    /// Set to "true" or "1" to insert a demo user with a few notes on boot.
    pub const SEED_DEMO_DATA: &str = "SEED_DEMO_DATA";
}

/// `DATABASE_URL` value selecting an in-memory database
pub const MEMORY_DATABASE_URL: &str = ":memory:";

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const BIND_ADDRESS: &str = "0.0.0.0";
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const DB_POOL_SIZE: u32 = 8;
    pub const SEED_DEMO_DATA: bool = false;
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub database_url: String,
    pub db_pool_size: u32,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            bind_address: defaults::BIND_ADDRESS.to_string(),
            database_url: defaults::DATABASE_URL.to_string(),
            db_pool_size: defaults::DB_POOL_SIZE,
            seed_demo_data: defaults::SEED_DEMO_DATA,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unparseable values fall
    /// back to the default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(env_vars::PORT) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Invalid {} '{}', using {}", env_vars::PORT, raw, defaults::PORT);
                defaults::PORT
            }),
            None => defaults::PORT,
        };

        let db_pool_size = match lookup(env_vars::DB_POOL_SIZE) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    log::warn!(
                        "Invalid {} '{}', using {}",
                        env_vars::DB_POOL_SIZE,
                        raw,
                        defaults::DB_POOL_SIZE
                    );
                    defaults::DB_POOL_SIZE
                }
            },
            None => defaults::DB_POOL_SIZE,
        };

        Self {
            port,
            bind_address: lookup(env_vars::BIND_ADDRESS)
                .unwrap_or_else(|| defaults::BIND_ADDRESS.to_string()),
            database_url: lookup(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            db_pool_size,
            seed_demo_data: lookup(env_vars::SEED_DEMO_DATA)
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults::SEED_DEMO_DATA),
        }
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.bind_address.clone(), self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
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
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, defaults::PORT);
        assert_eq!(config.database_url, defaults::DATABASE_URL);
        assert_eq!(config.db_pool_size, defaults::DB_POOL_SIZE);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_values_from_env() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("DATABASE_URL", ":memory:"),
            ("DB_POOL_SIZE", "2"),
            ("SEED_DEMO_DATA", "TRUE"),
        ]));
        assert_eq!(config.port, 9000);
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.db_pool_size, 2);
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "eighty"), ("DB_POOL_SIZE", "0")]));
        assert_eq!(config.port, defaults::PORT);
        assert_eq!(config.db_pool_size, defaults::DB_POOL_SIZE);
    }
}
