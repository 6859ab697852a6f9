//! services/api/src/adapters/token.rs
//!
//! Verifies access tokens minted by the external users/auth service.
//! Tokens are HS256 JWTs signed with the shared `TOKEN_SECRET`.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use positions_core::domain::{Caller, Role};
use positions_core::ports::{PortError, PortResult, TokenVerifier};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The claims the auth service puts into every access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub public_id: String,
    pub role: Role,
    /// Expiry as seconds since the Unix epoch.
    pub exp: usize,
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> PortResult<Caller> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            warn!("Rejected access token: {}", e);
            PortError::Unauthorized
        })?;
        Ok(Caller {
            public_id: data.claims.public_id,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: Role, exp_offset: i64) -> String {
        let claims = Claims {
            public_id: "R1".to_string(),
            role,
            exp: (chrono::Utc::now().timestamp() + exp_offset) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let verifier = JwtVerifier::new("secret");
        let caller = verifier.verify(&token("secret", Role::Recruiter, 3600)).unwrap();
        assert_eq!(caller.public_id, "R1");
        assert_eq!(caller.role, Role::Recruiter);
    }

    #[test]
    fn rejects_wrong_secret() {
        let verifier = JwtVerifier::new("secret");
        let err = verifier.verify(&token("other", Role::Recruiter, 3600)).unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
    }

    #[test]
    fn rejects_expired_token() {
        let verifier = JwtVerifier::new("secret");
        let err = verifier.verify(&token("secret", Role::Candidate, -3600)).unwrap_err();
        assert!(matches!(err, PortError::Unauthorized));
    }

    #[test]
    fn rejects_garbage() {
        let verifier = JwtVerifier::new("secret");
        assert!(verifier.verify("not-a-jwt").is_err());
    }
}
