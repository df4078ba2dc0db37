use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::database::{MongoDB, USERS};
use crate::models::UserRole;
use crate::utils::AppError;
use mongodb::bson::doc;

/// JWT claims. Whatever identity payload the client posted to `/jwt` is kept
/// alongside the registered claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Signs and verifies access tokens with the server-held HS256 secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Mints a token for an arbitrary identity payload (normally `{ "email": ... }`)
    pub fn issue(&self, payload: Value) -> Result<String, AppError> {
        let mut extra = match payload {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::InvalidRequest(
                    "token payload must be a JSON object".to_string(),
                ))
            }
        };

        let email = match extra.remove("email") {
            Some(Value::String(email)) => Some(email),
            Some(other) => {
                // Keep non-string identities verbatim, they just don't authorize anything
                extra.insert("email".to_string(), other);
                None
            }
            None => None,
        };
        for registered in ["iat", "exp", "nbf", "aud", "jti"] {
            extra.remove(registered);
        }

        let now = Utc::now();
        let claims = Claims {
            email,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Some(Uuid::new_v4().to_string()),
            extra,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Checks signature and expiry
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Loads the role record for an email, if any
pub async fn find_user_role(db: &MongoDB, email: &str) -> Result<Option<UserRole>, AppError> {
    let record = db
        .collection::<UserRole>(USERS)
        .find_one(doc! { "email": email })
        .await?;
    Ok(record)
}

/// Admin gate: the caller must have a user record whose role is "admin"
pub fn ensure_admin(record: Option<&UserRole>) -> Result<(), AppError> {
    match record {
        Some(user) if user.is_admin() => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}
