use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims carried by every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,  // user id
    pub name: String, // user name
    pub role: String, // ADMIN | USER
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl JwtClaims {
    /// Numeric user id from `sub`, if it is one.
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_seconds: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(expiry_seconds = config.expiry_seconds, "JWT auth initialized");
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            expiry_seconds: config.expiry_seconds,
        }
    }

    pub fn create_token(&self, user_id: i32, name: &str, role: &str) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            exp: (now + Duration::seconds(self.expiry_seconds)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Checks signature and expiry, returning the decoded claims.
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let data = decode::<JwtClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("test-secret-that-is-at-least-32-characters").unwrap())
    }

    #[test]
    fn test_issued_token_verifies() {
        let auth = auth();
        let token = auth.create_token(7, "user", "USER").unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.name, "user");
        assert_eq!(claims.role, "USER");
        assert!(claims.exp > claims.iat);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_admin_role_is_recognised() {
        let auth = auth();
        let token = auth.create_token(1, "root", "ADMIN").unwrap();
        assert!(auth.verify_token(&token).unwrap().is_admin());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = JwtAuth::new(&JwtConfig::new("another-secret-that-is-32-characters-long").unwrap());
        let token = other.create_token(1, "user", "USER").unwrap();
        assert!(auth().verify_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = JwtConfig::new("test-secret-that-is-at-least-32-characters")
            .unwrap()
            .with_expiry_seconds(-3600);
        let auth = JwtAuth::new(&config);
        let token = auth.create_token(1, "user", "USER").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(auth().verify_token("not.a.jwt").is_err());
    }
}
