use base64::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD, decode_config, encode_config};
use jwt_simple::algorithms::MACLike;
use jwt_simple::prelude::{
    Claims, Duration as JwtDuration, HS256Key, NoCustomClaims, VerificationOptions,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use std::collections::HashSet;

const TOKEN_ISSUER: &str = "dinnerbell";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid auth key")]
    InvalidKey,
    #[error("invalid auth token")]
    InvalidToken,
    #[error("auth token missing subject")]
    MissingSubject,
}

/// HS256 secret that signs the bearer tokens household members send to the
/// device and settings endpoints.
#[derive(Clone)]
pub struct AuthKey(HS256Key);

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

impl AuthKey {
    /// Accepts the key as URL-safe or standard base64, padded or not.
    pub fn decode(raw: &str) -> Result<Self, AuthError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuthError::InvalidKey);
        }

        let decoded = decode_config(trimmed, URL_SAFE_NO_PAD)
            .or_else(|_| decode_config(trimmed, STANDARD))
            .or_else(|_| decode_config(trimmed, STANDARD_NO_PAD))
            .map_err(|_| AuthError::InvalidKey)?;

        if decoded.is_empty() {
            return Err(AuthError::InvalidKey);
        }

        Ok(Self(HS256Key::from_bytes(&decoded)))
    }

    pub fn issue_token(&self, subject: &str, ttl_days: u64) -> Result<String, AuthError> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AuthError::MissingSubject);
        }
        if ttl_days == 0 {
            return Err(AuthError::InvalidToken);
        }
        let claims = Claims::create(JwtDuration::from_days(ttl_days))
            .with_subject(subject)
            .with_issuer(TOKEN_ISSUER);
        self.0
            .authenticate(claims)
            .map_err(|_| AuthError::InvalidToken)
    }

    /// Returns the token's subject when the signature, issuer and expiry check out.
    pub fn verify_token(&self, token: &str) -> Result<String, AuthError> {
        let options = VerificationOptions {
            allowed_issuers: Some(HashSet::from([TOKEN_ISSUER.to_string()])),
            ..VerificationOptions::default()
        };

        let claims = self
            .0
            .verify_token::<NoCustomClaims>(token, Some(options))
            .map_err(|_| AuthError::InvalidToken)?;

        if claims.expires_at.is_none() {
            return Err(AuthError::InvalidToken);
        }

        match claims.subject {
            Some(subject) if !subject.trim().is_empty() => Ok(subject),
            _ => Err(AuthError::MissingSubject),
        }
    }
}

pub fn generate_auth_key() -> String {
    let mut rng = OsRng;
    generate_auth_key_with_rng(&mut rng)
}

pub(crate) fn generate_auth_key_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> String {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    encode_config(bytes, URL_SAFE_NO_PAD)
}
