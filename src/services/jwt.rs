use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};

use crate::models::{Role, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // uid from the identity provider
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

pub struct JwtService;

impl JwtService {
    fn sign(user: &User, expiry: i64, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: user.uid.clone(),
            role: user.role,
            name: user.display_name.clone(),
            email: user.email.clone(),
            exp: now + expiry,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn generate_access_token(user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        Self::sign(
            user,
            crate::config::Config::jwt_expiry(),
            &crate::config::Config::jwt_secret(),
        )
    }

    pub fn generate_refresh_token(user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        Self::sign(
            user,
            crate::config::Config::jwt_refresh_expiry(),
            &crate::config::Config::jwt_refresh_secret(),
        )
    }

    pub fn verify_token(token: &str, is_refresh: bool) -> Result<Claims, jsonwebtoken::errors::Error> {
        let secret = if is_refresh {
            crate::config::Config::jwt_refresh_secret()
        } else {
            crate::config::Config::jwt_secret()
        };

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}
