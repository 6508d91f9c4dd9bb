//! JWT authentication module.
//!
//! Token generation and validation, password hashing, and the [`AuthUser`]
//! extractor every protected route takes.
//!
//! ## Request Authentication
//! ```text
//! Authorization: Bearer <jwt>        sb-access-token=<jwt> cookie
//!          │                                   │
//!          └──────────────┬────────────────────┘
//!                         ▼
//!           verify signature + expiry + token_type
//!                         │
//!          ┌──────────────┴──────────────┐
//!          ▼                             ▼
//!      AuthUser                     401 { error }
//! ```
//!
//! A token that fails verification is rejected. Nothing is read from an
//! unverified payload.

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use shikkha_core::access::{ensure, resolve_school, Action, Resource};
use shikkha_core::{Principal, Role, User};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub role: Role,

    /// `None` for developers
    pub school_id: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

/// JWT token manager.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(secret: &str, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    pub fn generate_access_token(&self, user: &User) -> ApiResult<String> {
        self.generate(user, ACCESS, self.access_lifetime_secs)
    }

    pub fn generate_refresh_token(&self, user: &User) -> ApiResult<String> {
        self.generate(user, REFRESH, self.refresh_lifetime_secs)
    }

    fn generate(&self, user: &User, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            school_id: user.school_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != ACCESS {
            return Err(ApiError::unauthorized("Expected access token"));
        }
        Ok(claims)
    }

    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != REFRESH {
            return Err(ApiError::unauthorized("Expected refresh token"));
        }
        Ok(claims)
    }
}

// =============================================================================
// Passwords
// =============================================================================

pub fn hash_password(password: &str) -> ApiResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Token Transport
// =============================================================================

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Finds the access token: `Authorization` header first, then the cookie.
pub fn token_from_headers<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
    {
        return Some(token);
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value)
        .filter(|v| !v.is_empty())
}

/// `Set-Cookie` value for the access token. An empty token with `max_age_secs`
/// of 0 clears the cookie.
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}{secure}")
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal: Principal,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.principal.user_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    /// Checks the role policy for this route.
    pub fn require(&self, resource: Resource, action: Action) -> ApiResult<()> {
        ensure(self.principal.role, resource, action)?;
        Ok(())
    }

    /// The school this request operates on. Developers must name one.
    pub fn school(&self, requested: Option<&str>) -> ApiResult<String> {
        Ok(resolve_school(&self.principal, requested)?)
    }

    /// Fails unless the caller holds `role`.
    pub fn require_role(&self, role: Role) -> ApiResult<()> {
        if self.principal.role != role {
            return Err(ApiError::Forbidden(format!("{} portal only", role)));
        }
        Ok(())
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        AuthUser {
            principal: Principal {
                user_id: claims.sub,
                role: claims.role,
                school_id: claims.school_id,
            },
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers, &state.config.cookie_name)
            .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

        let claims = state.jwt.validate_access_token(token)?;
        Ok(claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> User {
        User {
            id: "7f1c0b1e-8a53-4c39-9d4e-0c1f0f5b2a11".to_string(),
            school_id: Some("school-1".to_string()),
            email: "admin@example.edu.bd".to_string(),
            full_name: "Admin".to_string(),
            role,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret", 3600, 86400);

        let access_token = manager.generate_access_token(&user(Role::Admin)).unwrap();
        let claims = manager.validate_access_token(&access_token).unwrap();

        assert_eq!(claims.sub, "7f1c0b1e-8a53-4c39-9d4e-0c1f0f5b2a11");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.school_id.as_deref(), Some("school-1"));
        assert_eq!(claims.token_type, "access");
    }

    #[test]
    fn test_wrong_token_type() {
        let manager = JwtManager::new("test-secret", 3600, 86400);

        let access_token = manager.generate_access_token(&user(Role::Teacher)).unwrap();
        assert!(manager.validate_refresh_token(&access_token).is_err());

        let refresh_token = manager.generate_refresh_token(&user(Role::Teacher)).unwrap();
        assert!(manager.validate_access_token(&refresh_token).is_err());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let ours = JwtManager::new("test-secret", 3600, 86400);
        let theirs = JwtManager::new("someone-else", 3600, 86400);

        let forged = theirs.generate_access_token(&user(Role::Developer)).unwrap();
        assert!(matches!(
            ours.validate_access_token(&forged),
            Err(ApiError::Unauthorized(_))
        ));
        assert!(ours.validate_access_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers, "sb-access-token"), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; sb-access-token=abc.def.ghi"));
        assert_eq!(token_from_headers(&headers, "sb-access-token"), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers, "sb-access-token"), Some("xyz"));

        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_session_cookie() {
        let cookie = session_cookie("sb-access-token", "abc", 3600, true);
        assert_eq!(cookie, "sb-access-token=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600; Secure");
        assert!(!session_cookie("sb-access-token", "", 0, false).contains("Secure"));
    }
}
