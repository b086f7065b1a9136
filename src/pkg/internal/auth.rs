use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::prelude::{Error, Result};

/// Identity bound to an in-flight request, as asserted by the identity
/// provider. Trusted verbatim once the token signature checks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Clone)]
pub struct IdentityVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl IdentityVerifier {
    /// An empty `secret` yields a verifier that rejects every token.
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&[audience]);
        }
        let key = (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes()));
        IdentityVerifier { key, validation }
    }

    pub fn verify(&self, token: &str) -> Result<Caller> {
        let key = self.key.as_ref().ok_or(Error::Unauthorized)?;
        let claims = decode::<Claims>(token, key, &self.validation)
            .map_err(|e| {
                tracing::warn!("rejected bearer token: {}", e);
                Error::Unauthorized
            })?
            .claims;
        let id = claims.sub.parse::<Uuid>().map_err(|_| {
            tracing::warn!("token subject {} is not a user id", &claims.sub);
            Error::Unauthorized
        })?;
        Ok(Caller {
            id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    use super::{Caller, Claims, IdentityVerifier};
    use crate::prelude::Error;

    pub(crate) const SECRET: &str = "test-secret";
    pub(crate) const AUDIENCE: &str = "authenticated";

    pub(crate) fn mint(sub: &str, email: &str, secret: &str, ttl: Duration) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            email: Some(email.to_string()),
            exp: (Utc::now() + ttl).timestamp() as usize,
            aud: Some(AUDIENCE.to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub(crate) fn token_for(id: Uuid) -> String {
        mint(&id.to_string(), "someone@example.com", SECRET, Duration::hours(1))
    }

    #[test]
    fn test_verify_accepts_signed_token() {
        let verifier = IdentityVerifier::new(SECRET, AUDIENCE);
        let id = Uuid::new_v4();
        let caller = verifier.verify(&token_for(id)).unwrap();
        assert_eq!(
            caller,
            Caller {
                id,
                email: Some("someone@example.com".into())
            }
        );
    }

    #[test]
    fn test_verify_rejects_bad_tokens() {
        let verifier = IdentityVerifier::new(SECRET, AUDIENCE);
        let id = Uuid::new_v4().to_string();

        let forged = mint(&id, "a@b.c", "other-secret", Duration::hours(1));
        assert!(matches!(verifier.verify(&forged), Err(Error::Unauthorized)));

        let expired = mint(&id, "a@b.c", SECRET, Duration::hours(-2));
        assert!(matches!(verifier.verify(&expired), Err(Error::Unauthorized)));

        let not_a_user = mint("service-role", "a@b.c", SECRET, Duration::hours(1));
        assert!(matches!(verifier.verify(&not_a_user), Err(Error::Unauthorized)));

        assert!(matches!(verifier.verify("garbage"), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let verifier = IdentityVerifier::new("", AUDIENCE);
        let token = mint(&Uuid::new_v4().to_string(), "a@b.c", "", Duration::hours(1));
        assert!(matches!(verifier.verify(&token), Err(Error::Unauthorized)));
    }
}
