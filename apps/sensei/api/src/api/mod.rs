use axum::{Router, middleware, routing::get};
use axum_helpers::{JwtAuth, jwt_auth_middleware};
use domain_projects::{
    InMemoryStore, PgProjectRepository, PgStatusRepository, PgTaskRepository, ProjectRepository,
    StatusRepository, TaskRepository,
};
use domain_users::{InMemoryUserRepository, PgUserRepository, UserRepository};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod auth;
pub mod health;
pub mod projects;

/// The storage behind every route.
///
/// Users stay a concrete type because `UserService` is generic over it; the
/// project side is shared as trait objects.
pub struct Repositories<U> {
    pub users: U,
    pub projects: Arc<dyn ProjectRepository>,
    pub statuses: Arc<dyn StatusRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories<PgUserRepository> {
    pub fn postgres(db: &DatabaseConnection) -> Self {
        Self {
            users: PgUserRepository::new(db.clone()),
            projects: Arc::new(PgProjectRepository::new(db.clone())),
            statuses: Arc::new(PgStatusRepository::new(db.clone())),
            tasks: Arc::new(PgTaskRepository::new(db.clone())),
        }
    }
}

impl Repositories<InMemoryUserRepository> {
    /// Process-local storage, used by tests and local experiments
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: InMemoryUserRepository::new(),
            projects: Arc::new(store.projects()),
            statuses: Arc::new(store.statuses()),
            tasks: Arc::new(store.tasks()),
        }
    }
}

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix is added by `create_router`.
///
/// `/auth` is public; everything under `/project` requires a bearer token.
pub fn routes<U>(repositories: Repositories<U>, jwt: JwtAuth) -> Router
where
    U: UserRepository + Clone + 'static,
{
    let users: Arc<dyn UserRepository> = Arc::new(repositories.users.clone());

    let protected = projects::router(&repositories, users)
        .route_layer(middleware::from_fn_with_state(jwt.clone(), jwt_auth_middleware));

    Router::new()
        .nest("/auth", auth::router(repositories.users, jwt))
        .nest("/project", protected)
}

/// `/ready`, checking the database connection.
pub fn ready_router(state: crate::state::AppState) -> Router {
    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
