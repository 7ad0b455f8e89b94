use std::env;

/// Storage connection settings, sourced from the environment once at startup
/// and passed explicitly into store construction.
#[derive(Debug, Clone)]
pub struct PgConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl PgConfig {
    /// Read `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`,
    /// falling back to local-postgres defaults. An unparseable `DB_PORT`
    /// falls back to 5432.
    pub fn from_env() -> PgConfig {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> PgConfig {
        PgConfig {
            host: get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            port: get("DB_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            database: get("DB_NAME").unwrap_or_else(|| "postgres".to_string()),
            user: get("DB_USER").unwrap_or_else(|| "postgres".to_string()),
            password: get("DB_PASSWORD").unwrap_or_else(|| "postgres".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = PgConfig::from_lookup(|_| None);
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.database, "postgres");
        assert_eq!(cfg.user, "postgres");
        assert_eq!(cfg.password, "postgres");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = PgConfig::from_lookup(|key| match key {
            "DB_HOST" => Some("db.internal".to_string()),
            "DB_PORT" => Some("5433".to_string()),
            "DB_NAME" => Some("reports".to_string()),
            _ => None,
        });
        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.port, 5433);
        assert_eq!(cfg.database, "reports");
        assert_eq!(cfg.user, "postgres");
    }

    #[test]
    fn malformed_port_falls_back() {
        let cfg = PgConfig::from_lookup(|key| match key {
            "DB_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(cfg.port, 5432);
    }
}
