//! sea-orm entities for the projects schema.

pub mod project;
pub mod project_member;
pub mod status;
pub mod task;
