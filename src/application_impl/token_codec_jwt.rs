use crate::application_port::{AccessToken, AuthError, TokenCodec};
use crate::domain_model::UserId;
use crate::domain_port::Clock;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TOKEN_ISSUER: &str = "chirpy";

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    exp: i64,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    iss: Option<String>,
}

fn encode_access(
    uid: UserId,
    cfg: &JwtConfig,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>), AuthError> {
    let exp_dt = now + cfg.access_ttl;
    let claims = AccessClaims {
        sub: Some(uid.to_string()),
        exp: exp_dt.timestamp(),
        iat: Some(now.timestamp()),
        iss: Some(cfg.issuer.clone()),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))?;
    Ok((token, exp_dt))
}

// Expiry is checked by the caller against the injected clock, so the library
// check is off and there is no leeway.
fn decode_access(token: &str, cfg: &JwtConfig) -> Result<AccessClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = false;
    v.validate_aud = false;
    v.set_required_spec_claims(&["exp"]);
    let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                AuthError::TokenInvalidSignature
            }
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenMalformed,
        })?;
    Ok(data.claims)
}

/// HS256 access tokens. Only HS256 is accepted on verify, whatever the token
/// header claims.
pub struct JwtHs256Codec {
    cfg: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        JwtHs256Codec { cfg, clock }
    }

    #[inline]
    fn parse_user_id(sub: Option<&str>) -> Result<UserId, AuthError> {
        sub.ok_or(AuthError::TokenMalformedSubject)?
            .parse::<UserId>()
            .map_err(|_| AuthError::TokenMalformedSubject)
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue_access_token(&self, user: UserId) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp_dt) = encode_access(user, &self.cfg, self.clock.now())?;
        Ok((AccessToken(token), exp_dt))
    }

    fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError> {
        let claims = decode_access(&token.0, &self.cfg)?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        let user_id = Self::parse_user_id(claims.sub.as_deref())?;
        if claims.iss.as_deref() != Some(self.cfg.issuer.as_str()) {
            return Err(AuthError::TokenMalformed);
        }

        Ok(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::ManualClock;
    use serde_json::json;

    const SECRET: &[u8] = b"supersecret";

    fn codec_with(secret: &[u8], clock: Arc<ManualClock>) -> JwtHs256Codec {
        JwtHs256Codec::new(
            JwtConfig {
                issuer: TOKEN_ISSUER.to_string(),
                access_ttl: Duration::hours(1),
                signing_key: secret.to_vec(),
            },
            clock,
        )
    }

    fn sign(header: Header, claims: serde_json::Value, secret: &[u8]) -> AccessToken {
        AccessToken(encode(&header, &claims, &EncodingKey::from_secret(secret)).unwrap())
    }

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let user = UserId::new_random();

        let (token, exp) = codec.issue_access_token(user).unwrap();

        assert_eq!(token.0.split('.').count(), 3);
        assert_eq!(exp, clock.now() + Duration::hours(1));
        assert_eq!(codec.verify_access_token(&token).unwrap(), user);
    }

    #[test]
    fn token_expires_after_ttl() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let (token, _) = codec.issue_access_token(UserId::new_random()).unwrap();

        clock.advance(Duration::minutes(59));
        assert!(codec.verify_access_token(&token).is_ok());

        clock.advance(Duration::minutes(1));
        assert!(matches!(
            codec.verify_access_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let issuer = codec_with(SECRET, clock.clone());
        let verifier = codec_with(b"wrongsecret", clock);
        let (token, _) = issuer.issue_access_token(UserId::new_random()).unwrap();

        assert!(matches!(
            verifier.verify_access_token(&token),
            Err(AuthError::TokenInvalidSignature)
        ));
    }

    #[test]
    fn other_hmac_algorithm_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let claims = json!({
            "sub": UserId::new_random().to_string(),
            "iss": TOKEN_ISSUER,
            "iat": clock.now().timestamp(),
            "exp": (clock.now() + Duration::hours(1)).timestamp(),
        });
        let token = sign(Header::new(Algorithm::HS512), claims, SECRET);

        assert!(matches!(
            codec.verify_access_token(&token),
            Err(AuthError::TokenInvalidSignature)
        ));
    }

    #[test]
    fn missing_subject_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let claims = json!({ "exp": (clock.now() + Duration::hours(1)).timestamp() });
        let token = sign(Header::new(Algorithm::HS256), claims, SECRET);

        assert!(matches!(
            codec.verify_access_token(&token),
            Err(AuthError::TokenMalformedSubject)
        ));
    }

    #[test]
    fn non_uuid_subject_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let claims = json!({
            "sub": "not-a-uuid",
            "iss": TOKEN_ISSUER,
            "exp": (clock.now() + Duration::hours(1)).timestamp(),
        });
        let token = sign(Header::new(Algorithm::HS256), claims, SECRET);

        assert!(matches!(
            codec.verify_access_token(&token),
            Err(AuthError::TokenMalformedSubject)
        ));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let claims = json!({
            "sub": UserId::new_random().to_string(),
            "iss": "someone-else",
            "exp": (clock.now() + Duration::hours(1)).timestamp(),
        });
        let token = sign(Header::new(Algorithm::HS256), claims, SECRET);

        assert!(matches!(
            codec.verify_access_token(&token),
            Err(AuthError::TokenMalformed)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let codec = codec_with(SECRET, Arc::new(ManualClock::starting_now()));

        for raw in ["this.is.not.a.jwt.token", "", "abc"] {
            assert!(
                matches!(
                    codec.verify_access_token(&AccessToken(raw.to_string())),
                    Err(AuthError::TokenMalformed)
                ),
                "{raw:?} should be malformed"
            );
        }
    }
}
