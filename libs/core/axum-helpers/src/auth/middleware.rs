use super::jwt::JwtAuth;
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Rejects requests without a valid `Authorization: Bearer <token>` header.
///
/// On success the decoded [`JwtClaims`](super::JwtClaims) are inserted into the
/// request extensions.
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        tracing::debug!("No bearer token in Authorization header");
        return AppError::Unauthorized("No token provided".to_string()).into_response();
    };

    let claims = match auth.verify_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("JWT verification failed: {}", e);
            return AppError::Unauthorized("Invalid token".to_string()).into_response();
        }
    };

    request.extensions_mut().insert(claims);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::extractors::CurrentUser;
    use axum::{Router, body::Body, http::{Request as HttpRequest, StatusCode}, routing::get};
    use tower::ServiceExt;

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/me", get(|CurrentUser(claims): CurrentUser| async move { claims.name }))
            .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware))
    }

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("middleware-secret-with-at-least-32-chars").unwrap())
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(auth())
            .oneshot(HttpRequest::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes_claims_through() {
        let auth = auth();
        let token = auth.create_token(3, "alice", "USER").unwrap();

        let response = app(auth)
            .oneshot(
                HttpRequest::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tampered_token_is_unauthorized() {
        let auth = auth();
        let token = format!("{}x", auth.create_token(3, "alice", "USER").unwrap());

        let response = app(auth)
            .oneshot(
                HttpRequest::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
