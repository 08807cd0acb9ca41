use core_config::{ConfigError, FromEnv, env_parse_or, env_required};

const MIN_SECRET_LEN: usize = 32;
const DEFAULT_EXPIRY_SECONDS: i64 = 3600;

/// JWT signing configuration.
///
/// - `JWT_SECRET` (required, at least 32 characters)
/// - `JWT_EXPIRY_SECONDS` (default 3600)
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_seconds: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        check_secret(&secret)?;
        Ok(Self {
            secret,
            expiry_seconds: DEFAULT_EXPIRY_SECONDS,
        })
    }

    pub fn with_expiry_seconds(mut self, expiry_seconds: i64) -> Self {
        self.expiry_seconds = expiry_seconds;
        self
    }
}

fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::Invalid {
            key: "JWT_SECRET".to_string(),
            details: format!(
                "must be at least {} characters (got {}). Generate one with: openssl rand -base64 32",
                MIN_SECRET_LEN,
                secret.len()
            ),
        });
    }
    Ok(())
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        check_secret(&secret)?;
        let expiry_seconds = env_parse_or("JWT_EXPIRY_SECONDS", DEFAULT_EXPIRY_SECONDS)?;

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    #[test]
    fn test_jwt_config_new_valid() {
        let config = JwtConfig::new(SECRET).unwrap();
        assert_eq!(config.secret, SECRET);
        assert_eq!(config.expiry_seconds, 3600);
    }

    #[test]
    fn test_jwt_config_new_too_short() {
        let err = JwtConfig::new("short").unwrap_err();
        assert!(err.to_string().contains("32 characters"));
    }

    #[test]
    fn test_jwt_config_from_env() {
        temp_env::with_vars(
            [("JWT_SECRET", Some(SECRET)), ("JWT_EXPIRY_SECONDS", Some("60"))],
            || {
                let config = JwtConfig::from_env().unwrap();
                assert_eq!(config.secret, SECRET);
                assert_eq!(config.expiry_seconds, 60);
            },
        );
    }

    #[test]
    fn test_jwt_config_from_env_missing() {
        temp_env::with_var_unset("JWT_SECRET", || {
            let err = JwtConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("JWT_SECRET"));
        });
    }
}
