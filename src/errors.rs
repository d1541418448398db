use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(msg) => AppError::NotFound(msg),
            DomainError::InvalidInput(msg) => AppError::InvalidArgument(msg),
            DomainError::InvalidState(msg) => AppError::InvalidState(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

// Infrastructure failures inside `web::block` closures bubble up through `?`.

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Internal(format!("Malformed stored document: {e}"))
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |message: &str| {
            serde_json::json!({
                "success": false,
                "message": message,
            })
        };
        match self {
            AppError::NotFound(_) => HttpResponse::NotFound().json(body(&self.to_string())),
            AppError::InvalidArgument(_) | AppError::InvalidState(_) => {
                HttpResponse::BadRequest().json(body(&self.to_string()))
            }
            AppError::Unauthorized(_) => HttpResponse::Unauthorized().json(body(&self.to_string())),
            AppError::Forbidden(_) => HttpResponse::Forbidden().json(body(&self.to_string())),
            AppError::Internal(_) => {
                HttpResponse::InternalServerError().json(body("Internal server error"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    use super::*;

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_argument_returns_400() {
        let resp = AppError::InvalidArgument("No products provided".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_state_returns_400() {
        let resp = AppError::InvalidState("Product already reviewed".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthorized_returns_401() {
        let resp = AppError::Unauthorized("Missing token".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn forbidden_returns_403() {
        let resp = AppError::Forbidden("Admins only".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn internal_error_returns_500_and_hides_detail() {
        let err = AppError::Internal("connection refused".to_string());
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound("Cart not found".to_string()).into();
        assert!(matches!(app_err, AppError::NotFound(_)));
        assert_eq!(app_err.to_string(), "Cart not found");
    }

    #[test]
    fn domain_invalid_input_maps_to_invalid_argument() {
        let app_err: AppError = DomainError::InvalidInput("bad value".to_string()).into();
        assert!(matches!(app_err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn domain_invalid_state_maps_to_invalid_state() {
        let app_err: AppError = DomainError::InvalidState("already reviewed".to_string()).into();
        assert!(matches!(app_err, AppError::InvalidState(_)));
    }

    #[test]
    fn domain_internal_maps_to_app_internal() {
        let app_err: AppError = DomainError::Internal("oops".to_string()).into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
