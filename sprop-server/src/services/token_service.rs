use jsonwebtoken::errors::Error;
use jsonwebtoken::{decode, DecodingKey, encode, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::configs::Auth;
use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub token: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: i32,
    pub username: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenService {
    expiration: u64,
    secret: String,
}

impl TokenService {
    pub fn new(auth: Auth) -> Self {
        Self {
            expiration: auth.expiration,
            secret: auth.secret,
        }
    }

    pub fn retrieve_token_claims(&self, token: &str) -> Result<TokenData<TokenClaims>, Error> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
    }

    pub fn generate_token(&self, user: &User) -> Result<Token, Error> {
        let iat = OffsetDateTime::now_utc().unix_timestamp().max(0) as u64;
        let exp = iat + self.expiration;

        let claims = TokenClaims {
            sub: user.id,
            username: user.username.clone(),
            iat,
            exp,
        };

        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_ref()))?;

        Ok(Token { token, iat, exp })
    }
}
