use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use axum_helpers::{
    AppError, AuditEvent, AuditOutcome, JwtAuth, ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        UnauthorizedResponse,
    },
};
use serde_json::json;
use utoipa::OpenApi;

use crate::error::UserError;
use crate::models::{AuthResponse, LoginUser, RegisterUser, User};
use crate::repository::UserRepository;
use crate::service::UserService;

const TAG: &str = "auth";

/// OpenAPI documentation for the auth endpoints
#[derive(OpenApi)]
#[openapi(
    paths(register, login),
    components(
        schemas(RegisterUser, LoginUser, AuthResponse),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Registration and login")
    )
)]
pub struct ApiDoc;

/// Application state for auth handlers
pub struct AuthState<R: UserRepository> {
    pub service: UserService<R>,
    pub jwt: JwtAuth,
}

impl<R: UserRepository> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            jwt: self.jwt.clone(),
        }
    }
}

impl<R: UserRepository> AuthState<R> {
    pub fn new(service: UserService<R>, jwt: JwtAuth) -> Self {
        Self { service, jwt }
    }

    fn issue(&self, user: &User) -> Result<AuthResponse, AppError> {
        let token = self
            .jwt
            .create_token(user.id, &user.name, &user.role.to_string())
            .map_err(|e| {
                tracing::error!("Failed to create access token: {:?}", e);
                AppError::InternalServerError("Failed to create token".to_string())
            })?;

        Ok(AuthResponse { id: user.id, token })
    }
}

/// Create the auth router (`/register`, `/login`)
pub fn router<R: UserRepository + 'static>(state: AuthState<R>) -> Router {
    Router::new()
        .route("/register", post(register::<R>))
        .route("/login", post(login::<R>))
        .with_state(state)
}

/// Register a new user and sign them in
#[utoipa::path(
    post,
    path = "/register",
    tag = TAG,
    request_body = RegisterUser,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(state): State<AuthState<R>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterUser>,
) -> Result<Json<AuthResponse>, AppError> {
    let name = input.name.clone();

    let user = match state.service.register(input).await {
        Ok(user) => user,
        Err(err) => {
            if matches!(err, UserError::DuplicateName(_)) {
                AuditEvent::new(None, "user.register", AuditOutcome::Failure)
                    .with_request(&headers)
                    .with_details(json!({ "name": name, "reason": "duplicate" }))
                    .log();
            }
            return Err(err.into());
        }
    };

    AuditEvent::new(Some(user.id), "user.register", AuditOutcome::Success)
        .with_resource(format!("user:{}", user.id))
        .with_request(&headers)
        .log();

    Ok(Json(state.issue(&user)?))
}

/// Exchange a name and password for a bearer token
#[utoipa::path(
    post,
    path = "/login",
    tag = TAG,
    request_body = LoginUser,
    responses(
        (status = 200, description = "Credentials accepted", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(state): State<AuthState<R>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginUser>,
) -> Result<Json<AuthResponse>, AppError> {
    let name = input.name.clone();

    let user = match state.service.login(input).await {
        Ok(user) => user,
        Err(err) => {
            if matches!(err, UserError::InvalidCredentials) {
                AuditEvent::new(None, "user.login", AuditOutcome::Denied)
                    .with_request(&headers)
                    .with_details(json!({ "name": name }))
                    .log();
            }
            return Err(err.into());
        }
    };

    AuditEvent::new(Some(user.id), "user.login", AuditOutcome::Success)
        .with_request(&headers)
        .log();

    Ok(Json(state.issue(&user)?))
}
