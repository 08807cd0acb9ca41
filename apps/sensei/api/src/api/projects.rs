use axum::Router;
use domain_projects::{ProjectsState, handlers};
use domain_users::UserRepository;
use std::sync::Arc;

use super::Repositories;

pub fn router<U>(repositories: &Repositories<U>, users: Arc<dyn UserRepository>) -> Router {
    let state = ProjectsState::new(
        repositories.projects.clone(),
        repositories.statuses.clone(),
        repositories.tasks.clone(),
        users,
    );
    handlers::router(state)
}
