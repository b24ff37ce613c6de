use crate::error::{AppError, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by tokens from the identity service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

/// The verified acting user of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        let name = claims
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| {
                claims
                    .email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });

        Self {
            name,
            email: claims.email,
        }
    }
}

pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
pub fn create_jwt(email: &str, name: Option<&str>, secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: email.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("test token should encode")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_token() {
        let token = create_jwt("ada@example.com", Some("Ada"), "secret");
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.email, "ada@example.com");

        let identity = Identity::from(claims);
        assert_eq!(identity.name, "Ada");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_jwt("ada@example.com", None, "secret");
        assert!(matches!(
            verify_jwt(&token, "other"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_missing_name_falls_back_to_email_local_part() {
        let identity = Identity::from(Claims {
            sub: "1".into(),
            email: "grace@example.com".into(),
            name: None,
            exp: 0,
        });
        assert_eq!(identity.name, "grace");
    }
}
