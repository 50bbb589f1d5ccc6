use anyhow::{anyhow, bail, Result};
use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};
use tracing::{info, warn};

use crate::validation::{
    PastInstantValidator, PastPolicy, DEFAULT_TOLERANCE_MINUTES, MAX_TOLERANCE_MINUTES,
};

pub struct Config {
    pub address: SocketAddr,
    pub db_path: PathBuf,
    pub past_policy: PastPolicy,
    /// None disables every admin route
    pub admin_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = try_load(&lookup, "CLUB_ADDRESS", "0.0.0.0:3000")?;
        let db_path = try_load(&lookup, "CLUB_DB_PATH", "club.db")?;

        let policy_name: String = try_load(&lookup, "CLUB_PAST_POLICY", "tolerance")?;
        let minutes: i64 = try_load(
            &lookup,
            "CLUB_PAST_TOLERANCE_MINUTES",
            &DEFAULT_TOLERANCE_MINUTES.to_string(),
        )?;

        if !(0..=MAX_TOLERANCE_MINUTES).contains(&minutes) {
            bail!(
                "CLUB_PAST_TOLERANCE_MINUTES must be between 0 and {MAX_TOLERANCE_MINUTES}, got {minutes}"
            );
        }

        let past_policy = match policy_name.trim().to_lowercase().as_str() {
            "strict" => PastPolicy::Strict,
            "tolerance" => PastPolicy::tolerance_minutes(minutes),
            other => bail!("CLUB_PAST_POLICY must be `strict` or `tolerance`, got `{other}`"),
        };

        let admin_token = lookup("CLUB_ADMIN_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        if admin_token.is_none() {
            warn!("CLUB_ADMIN_TOKEN not set, admin routes are disabled");
        }

        Ok(Self {
            address,
            db_path,
            past_policy,
            admin_token,
        })
    }

    pub fn validator(&self) -> PastInstantValidator {
        PastInstantValidator::new(self.past_policy)
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("Invalid {key} value: {e}"))
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.address.port(), 3000);
        assert_eq!(config.db_path, PathBuf::from("club.db"));
        assert_eq!(config.past_policy, PastPolicy::tolerance_minutes(5));
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CLUB_ADDRESS", "127.0.0.1:8080"),
            ("CLUB_DB_PATH", "/tmp/club.db"),
            ("CLUB_PAST_POLICY", "Strict"),
            ("CLUB_ADMIN_TOKEN", " s3cret "),
        ]))
        .unwrap();

        assert_eq!(config.address.port(), 8080);
        assert_eq!(config.past_policy, PastPolicy::Strict);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.validator().policy(), PastPolicy::Strict);
    }

    #[test]
    fn test_custom_tolerance_window() {
        let config =
            Config::from_lookup(lookup_from(&[("CLUB_PAST_TOLERANCE_MINUTES", "15")])).unwrap();
        assert_eq!(config.past_policy, PastPolicy::tolerance_minutes(15));
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(Config::from_lookup(lookup_from(&[("CLUB_PAST_POLICY", "lenient")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CLUB_PAST_TOLERANCE_MINUTES", "-1")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CLUB_PAST_TOLERANCE_MINUTES", "five")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CLUB_ADDRESS", "localhost")])).is_err());
    }

    #[test]
    fn test_oversized_tolerance_is_rejected() {
        for minutes in ["1441", "1000000000000", "9223372036854775807"] {
            let result = Config::from_lookup(lookup_from(&[("CLUB_PAST_TOLERANCE_MINUTES", minutes)]));
            assert!(result.is_err(), "{minutes} should be rejected");
        }

        let config =
            Config::from_lookup(lookup_from(&[("CLUB_PAST_TOLERANCE_MINUTES", "1440")])).unwrap();
        assert_eq!(config.past_policy, PastPolicy::tolerance_minutes(MAX_TOLERANCE_MINUTES));
    }

    #[test]
    fn test_blank_admin_token_is_unset() {
        let config = Config::from_lookup(lookup_from(&[("CLUB_ADMIN_TOKEN", "   ")])).unwrap();
        assert!(config.admin_token.is_none());
    }
}
