use serde::Deserialize;

/// argon2id hash of the development password `shepherd-admin`.
pub const DEFAULT_ADMIN_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$Whw+nwt9JOaowfPVtwkuTA$giqVnQm5/8XV8GENKh3ZlSbozQu4f73D2v7Yuc4+6mM";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Administrative account ensured at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub display_name: String,
    pub login_name: String,
    pub password_hash: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            display_name: "Admin".into(),
            login_name: "admin".into(),
            password_hash: DEFAULT_ADMIN_PASSWORD_HASH.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub bootstrap_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "shepherd".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "shepherd-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };

        let defaults = AdminConfig::default();
        let admin = AdminConfig {
            display_name: std::env::var("ADMIN_DISPLAY_NAME").unwrap_or(defaults.display_name),
            login_name: std::env::var("ADMIN_LOGIN_NAME").unwrap_or(defaults.login_name),
            password_hash: std::env::var("ADMIN_PASSWORD_HASH").unwrap_or(defaults.password_hash),
        };

        let bootstrap_enabled = std::env::var("BOOTSTRAP_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            jwt,
            admin,
            bootstrap_enabled,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_flag_accepts_common_false_spellings() {
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" OFF "));
        assert!(!parse_flag("0"));
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
    }

    #[test]
    fn default_admin_hash_is_argon2id() {
        let admin = AdminConfig::default();
        assert_eq!(admin.login_name, "admin");
        assert!(admin.password_hash.starts_with("$argon2id$"));
    }
}
