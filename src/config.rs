use std::time::Duration;

use anyhow::{bail, Context};
use argon2::Params;
use serde::Deserialize;

pub const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl: Duration,
}

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub production: bool,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so it can be exercised
    /// without mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let production = lookup("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if production => bail!("JWT_SECRET must be set when APP_ENV=production"),
            None => {
                tracing::warn!("JWT_SECRET not set; using the development default");
                DEFAULT_JWT_SECRET.to_string()
            }
        };
        if production && secret == DEFAULT_JWT_SECRET {
            bail!("JWT_SECRET must not be the development default in production");
        }

        let ttl = match lookup("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration(&raw)
                .with_context(|| format!("invalid JWT_EXPIRES_IN: {raw:?}"))?,
            None => Duration::from_secs(24 * 60 * 60),
        };

        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "authapi".into()),
            ttl,
        };

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "ARGON2_ITERATIONS", defaults.iterations)?,
            parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", defaults.parallelism)?,
        };

        Ok(Self {
            database_url,
            production,
            jwt,
            password,
        })
    }
}

fn parse_or<F>(lookup: &F, key: &str, default: u32) -> anyhow::Result<u32>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Parses a lifetime such as `3600`, `90s`, `30m`, `24h` or `7d`.
/// A bare number is seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    if digits.is_empty() {
        bail!("missing amount");
    }
    let amount: u64 = digits.parse()?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        other => bail!("unknown unit {other:?}"),
    };
    let secs = amount
        .checked_mul(multiplier)
        .context("duration overflows")?;
    if secs == 0 {
        bail!("duration must be positive");
    }
    Ok(Duration::from_secs(secs))
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parses_lifetimes() {
        assert_eq!(parse_duration("3600").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("24h").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn rejects_bad_lifetimes() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10w").is_err());
        assert!(parse_duration("0").is_err());
    }

    #[test]
    fn defaults_apply_outside_production() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert!(!cfg.production);
        assert_eq!(cfg.jwt.secret, DEFAULT_JWT_SECRET);
        assert_eq!(cfg.jwt.issuer, "authapi");
        assert_eq!(cfg.jwt.ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.password, PasswordConfig::default());
    }

    #[test]
    fn production_requires_a_real_secret() {
        let missing = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("APP_ENV", "production"),
        ]));
        assert!(missing.is_err());

        let default = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", DEFAULT_JWT_SECRET),
        ]));
        assert!(default.is_err());

        let ok = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "a-real-secret"),
            ("JWT_EXPIRES_IN", "1h"),
        ]))
        .unwrap();
        assert!(ok.production);
        assert_eq!(ok.jwt.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn database_url_is_required() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn argon2_overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ARGON2_MEMORY_KIB", "4096"),
            ("ARGON2_ITERATIONS", "3"),
        ]))
        .unwrap();
        assert_eq!(cfg.password.memory_kib, 4096);
        assert_eq!(cfg.password.iterations, 3);
        assert_eq!(cfg.password.parallelism, Params::DEFAULT_P_COST);

        let bad = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ARGON2_ITERATIONS", "many"),
        ]));
        assert!(bad.is_err());
    }
}
