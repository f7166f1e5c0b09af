use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const ACCESS_TOKEN_SECS: i64 = 24 * 3600; // 24 hours
pub const REFRESH_TOKEN_SECS: i64 = 30 * 24 * 3600; // 30 days

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT Claims stored in the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub user_id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and checks HS256 tokens. No user store sits behind it.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Issue an access/refresh pair. The `sub` claim is a deterministic UUID
    /// derived from the email hash, so the same email always maps to the same id.
    pub fn issue_pair(&self, email: &str) -> Result<TokenPair> {
        let user_id = email_to_uuid(email);
        Ok(TokenPair {
            user_id,
            access_token: self.create_token(user_id, email, TokenKind::Access)?,
            refresh_token: self.create_token(user_id, email, TokenKind::Refresh)?,
        })
    }

    fn create_token(&self, user_id: Uuid, email: &str, kind: TokenKind) -> Result<String> {
        let now = chrono::Utc::now();
        let lifetime = match kind {
            TokenKind::Access => ACCESS_TOKEN_SECS,
            TokenKind::Refresh => REFRESH_TOKEN_SECS,
        };
        let exp = now + chrono::Duration::seconds(lifetime);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            kind,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token. Returns claims if valid and not expired.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

/// Derive a deterministic UUID from an email address. Case-insensitive.
pub fn email_to_uuid(email: &str) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(b"verify-user:");
    hasher.update(email.trim().to_lowercase().as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    // Stamp version/variant bits so it parses as a v4 UUID.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}
