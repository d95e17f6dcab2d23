use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use log::{info, warn};

#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub paths_file: PathBuf,
    pub records_file: PathBuf,
    pub dialogue_db: String,
    pub leaderboard_size: usize,
}

impl Config {
    /// Reads the configuration from the environment; call `dotenv()` first to
    /// pick up a `.env` file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            paths_file: try_load(&lookup, "PATHS_FILE", "paths.json")?,
            records_file: try_load(&lookup, "RECORDS_FILE", "records.json")?,
            dialogue_db: try_load(&lookup, "DIALOGUE_DB", "db.sqlite")?,
            leaderboard_size: try_load(&lookup, "LEADERBOARD_SIZE", "10")?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError {
            key: key.to_string(),
            value,
            reason: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.paths_file, PathBuf::from("paths.json"));
        assert_eq!(config.records_file, PathBuf::from("records.json"));
        assert_eq!(config.dialogue_db, "db.sqlite");
        assert_eq!(config.leaderboard_size, 10);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("RECORDS_FILE", "/var/lib/learnpath/records.json"),
            ("LEADERBOARD_SIZE", "25"),
        ]))
        .unwrap();
        assert_eq!(
            config.records_file,
            PathBuf::from("/var/lib/learnpath/records.json")
        );
        assert_eq!(config.leaderboard_size, 25);
    }

    #[test]
    fn rejects_unparsable_numbers() {
        let err = Config::from_lookup(lookup(&[("LEADERBOARD_SIZE", "ten")])).unwrap_err();
        assert_eq!(err.key, "LEADERBOARD_SIZE");
        assert_eq!(err.value, "ten");
    }
}
