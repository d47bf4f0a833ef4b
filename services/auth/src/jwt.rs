//! JWT service for token generation and validation
//!
//! Tokens are signed with RS256. Access tokens carry the user's id, email
//! and role; refresh tokens carry the same claims but are only accepted by
//! the refresh and logout endpoints.

use anyhow::Result;
use common::token::{Claims, TokenType, TokenVerifier, pem_from_env};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::User;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key for signing tokens (PEM format) or path to private key file
    /// - `JWT_PUBLIC_KEY`: Public key for verifying tokens (PEM format) or path to public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let private_key = pem_from_env("JWT_PRIVATE_KEY", env!("CARGO_MANIFEST_DIR"))?;
        let public_key = pem_from_env("JWT_PUBLIC_KEY", env!("CARGO_MANIFEST_DIR"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            private_key,
            public_key,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Seconds since the Unix epoch
pub fn now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let verifier = TokenVerifier::from_public_pem(&config.public_key)?;

        Ok(JwtService {
            encoding_key,
            verifier,
            config,
        })
    }

    fn generate(&self, user: &User, token_type: TokenType, lifetime: u64) -> Result<String> {
        let now = now()?;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + lifetime,
            jti: Uuid::new_v4(),
            token_type,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.generate(user, TokenType::Access, self.config.access_token_expiry)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.generate(user, TokenType::Refresh, self.config.refresh_token_expiry)
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        self.verifier.verify(token)
    }

    /// Validate a token and require it to be a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Refresh {
            anyhow::bail!("Token is not a refresh token");
        }
        Ok(claims)
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }

    /// Seconds left before `claims` expire
    pub fn remaining_lifetime(&self, claims: &Claims) -> Result<u64> {
        Ok(claims.exp.saturating_sub(now()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jwt_service, sample_user};
    use rules::Role;

    #[test]
    fn test_access_token_round_trip() {
        let service = jwt_service();
        let user = sample_user("agent@ministere.example", Role::Manager, true);

        let token = service.generate_access_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, service.access_token_expiry());
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let service = jwt_service();
        let user = sample_user("agent@ministere.example", Role::User, true);

        let access = service.generate_access_token(&user).unwrap();
        assert!(service.validate_refresh_token(&access).is_err());

        let refresh = service.generate_refresh_token(&user).unwrap();
        assert!(service.validate_refresh_token(&refresh).is_ok());
        assert!(service.verifier().verify_access(&refresh).is_err());
    }

    #[test]
    fn test_tokens_issued_together_differ() {
        let service = jwt_service();
        let user = sample_user("agent@ministere.example", Role::User, true);

        let first = service.generate_refresh_token(&user).unwrap();
        let second = service.generate_refresh_token(&user).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let service = jwt_service();
        let user = sample_user("agent@ministere.example", Role::User, true);

        let mut token = service.generate_access_token(&user).unwrap();
        token.push('x');
        assert!(service.validate_token(&token).is_err());
    }
}
