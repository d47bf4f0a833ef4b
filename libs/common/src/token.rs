//! JWT claims shared by the issuing and the verifying services
//!
//! Tokens are RS256-signed. The auth service signs with the private key;
//! every service verifies with the public key through [`TokenVerifier`].

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use rules::{Role, Subject};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// User role
    pub role: Role,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Unique token id, so two tokens issued in the same second differ
    pub jti: Uuid,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Authenticated caller, as recovered from an access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Subject for AuthUser {
    fn role(&self) -> Role {
        self.role
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Resolve a key given either as PEM text or as a path to a PEM file.
///
/// Relative paths are tried against the working directory first, then
/// against `base_dir`.
pub fn load_pem(value: &str, base_dir: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(base_dir);
            path.push(value);
            std::fs::read_to_string(path)
        })
        .map(|pem| pem.trim().to_string())
        .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", value, e))
}

/// Read `var` from the environment and resolve it with [`load_pem`]
pub fn pem_from_env(var: &str, base_dir: &str) -> Result<String> {
    let value = std::env::var(var)
        .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?;
    load_pem(&value, base_dir)
}

/// Verifies RS256 tokens against a public key
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn from_public_pem(public_key: &str) -> Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Validate signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a token and require it to be an access token
    pub fn verify_access(&self, token: &str) -> Result<AuthUser> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            anyhow::bail!("Token is not an access token");
        }
        Ok(claims.into())
    }
}
