use axum::Router;
use axum_helpers::JwtAuth;
use domain_users::{
    UserRepository, UserService,
    handlers::{self, AuthState},
};

pub fn router<U: UserRepository + 'static>(users: U, jwt: JwtAuth) -> Router {
    let service = UserService::new(users);
    handlers::router(AuthState::new(service, jwt))
}
