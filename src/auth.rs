//! Identity & Access boundary.
//!
//! Token issuance, password handling, and account lifecycle belong to the
//! identity service. This module implements only the consuming side of that
//! contract: extract the bearer token from a request, resolve its SHA-256
//! digest against the `users` table, and gate roles.

use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use diesel::prelude::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::schema::users;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
    Tailor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Tailor => "tailor",
        }
    }

    fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "tailor" => Ok(Role::Tailor),
            other => Err(AppError::Internal(format!("Unknown role '{other}'"))),
        }
    }
}

/// The authenticated caller, as resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            return Ok(());
        }
        Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let unauthorized =
        || AppError::Unauthorized("Missing or invalid Authorization header".to_string());

    let value = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(unauthorized)?
        .to_str()
        .map_err(|_| unauthorized())?;

    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next().ok_or_else(unauthorized)?;
    let token = parts.next().unwrap_or("").trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(unauthorized());
    }

    Ok(token.to_string())
}

/// Hex SHA-256 of a token; only digests are stored.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Resolve a bearer token to its user. Unknown tokens are Unauthorized.
pub fn authenticate(conn: &mut PgConnection, token: &str) -> Result<AuthUser, AppError> {
    let digest = token_digest(token);

    let user = users::table
        .filter(users::token_hash.eq(&digest))
        .select(User::as_select())
        .first(conn)
        .optional()?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized("Invalid API token".to_string()));
    };

    Ok(AuthUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: Role::parse(&user.role)?,
    })
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    fn request_with_auth(value: &str) -> actix_web::HttpRequest {
        TestRequest::default()
            .insert_header((AUTHORIZATION, value))
            .to_http_request()
    }

    #[test]
    fn extracts_bearer_token() {
        let req = request_with_auth("Bearer secret-token");
        assert_eq!(bearer_token(&req).expect("token"), "secret-token");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let req = request_with_auth("bearer secret-token");
        assert_eq!(bearer_token(&req).expect("token"), "secret-token");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let err = bearer_token(&req).expect_err("must fail");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn wrong_scheme_is_unauthorized() {
        let req = request_with_auth("Basic dXNlcjpwYXNz");
        assert!(matches!(
            bearer_token(&req),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn empty_token_is_unauthorized() {
        let req = request_with_auth("Bearer ");
        assert!(matches!(
            bearer_token(&req),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_digest_is_stable_hex_sha256() {
        let digest = token_digest("secret-token");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, token_digest("secret-token"));
        assert_ne!(digest, token_digest("other-token"));
    }

    #[test]
    fn admin_gate_rejects_plain_users() {
        let user = AuthUser {
            id: Uuid::new_v4(),
            name: "Customer".to_string(),
            email: "customer@example.com".to_string(),
            role: Role::User,
        };
        assert!(matches!(
            user.require_role(Role::Admin),
            Err(AppError::Forbidden(_))
        ));
        assert!(user.require_role(Role::User).is_ok());
    }
}
