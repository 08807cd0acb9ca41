//! PostgreSQL integration tests for the project, status and task repositories.
//!
//! Each test starts its own PostgreSQL container, so Docker must be available.

use chrono::{NaiveDate, NaiveDateTime};
use domain_projects::*;
use domain_users::PgUserRepository;
use std::collections::BTreeSet;
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase, assertions::assert_err};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn state(db: &TestDatabase) -> ProjectsState {
    ProjectsState::new(
        Arc::new(PgProjectRepository::new(db.connection())),
        Arc::new(PgStatusRepository::new(db.connection())),
        Arc::new(PgTaskRepository::new(db.connection())),
        Arc::new(PgUserRepository::new(db.connection())),
    )
}

fn new_task(title: &str, project_id: i32, status: &str, assigner_id: i32) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: String::new(),
        start_date: Some(at(1, 9)),
        end_date: at(3, 17),
        status: status.to_string(),
        project_id,
        assigner_id,
    }
}

#[tokio::test]
async fn test_project_roundtrip_with_members() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("project_roundtrip");
    let alice = db.create_test_user(&builder.user_name("alice")).await;
    let bob = db.create_test_user(&builder.user_name("bob")).await;
    let repo = PgProjectRepository::new(db.connection());

    let id = repo
        .create(NewProject {
            name: builder.name("project", "main"),
            member_ids: BTreeSet::from([alice, bob]),
        })
        .await
        .unwrap();

    let project = repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(project.name, builder.name("project", "main"));
    assert_eq!(project.member_ids, BTreeSet::from([alice, bob]));

    let of_bob = repo.get_by_foreign_key(bob).await.unwrap();
    assert_eq!(of_bob.len(), 1);
    assert_eq!(of_bob[0].id, id);
}

#[tokio::test]
async fn test_update_replaces_member_set() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("project_members");
    let alice = db.create_test_user(&builder.user_name("alice")).await;
    let bob = db.create_test_user(&builder.user_name("bob")).await;
    let repo = PgProjectRepository::new(db.connection());

    let id = repo
        .create(NewProject {
            name: "Relaunch".to_string(),
            member_ids: BTreeSet::from([alice]),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            id,
            ProjectChanges {
                name: None,
                member_ids: Some(BTreeSet::from([bob])),
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name, "Relaunch");
    assert_eq!(updated.member_ids, BTreeSet::from([bob]));
    assert!(updated.updated_at >= updated.created_at);
    assert!(repo.get_by_foreign_key(alice).await.unwrap().is_empty());

    let missing = repo.update(id + 1000, ProjectChanges::default()).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_duplicate_status_name_is_rejected_per_project() {
    let db = TestDatabase::new().await;
    let projects = PgProjectRepository::new(db.connection());
    let statuses = PgStatusRepository::new(db.connection());

    let first = projects
        .create(NewProject {
            name: "First".to_string(),
            member_ids: BTreeSet::new(),
        })
        .await
        .unwrap();
    let second = projects
        .create(NewProject {
            name: "Second".to_string(),
            member_ids: BTreeSet::new(),
        })
        .await
        .unwrap();

    let todo = NewStatus {
        name: "todo".to_string(),
        project_id: first,
    };
    statuses.create(todo.clone()).await.unwrap();

    let err = assert_err(statuses.create(todo).await, "second todo in same project");
    assert!(matches!(err, ProjectError::DuplicateStatus(_)));

    // Same name in another project is fine
    statuses
        .create(NewStatus {
            name: "todo".to_string(),
            project_id: second,
        })
        .await
        .unwrap();

    let found = statuses.get_by_key(second, "todo").await.unwrap().unwrap();
    assert_eq!(found.project_id, second);
}

#[tokio::test]
async fn test_status_for_unknown_project_is_not_found() {
    let db = TestDatabase::new().await;
    let statuses = PgStatusRepository::new(db.connection());

    let err = assert_err(
        statuses
            .create(NewStatus {
                name: "todo".to_string(),
                project_id: 4242,
            })
            .await,
        "status without project",
    );

    assert!(matches!(err, ProjectError::ProjectNotFound(4242)));
}

#[tokio::test]
async fn test_task_lifecycle_through_services() {
    let db = TestDatabase::new().await;
    let alice = db.create_test_user("alice").await;
    let state = state(&db);

    let project = state
        .projects
        .create(CreateProject {
            name: "Relaunch".to_string(),
            member_ids: vec![alice],
        })
        .await
        .unwrap();
    state
        .statuses
        .create(project.id, CreateStatus { name: "todo".to_string() })
        .await
        .unwrap();
    state
        .statuses
        .create(project.id, CreateStatus { name: "done".to_string() })
        .await
        .unwrap();

    let task = state
        .tasks
        .create(new_task("Write docs", project.id, "todo", alice))
        .await
        .unwrap();
    assert_eq!(task.status, "todo");
    assert_eq!(task.start_date, at(1, 9));

    let updated = state
        .tasks
        .update(
            task.id,
            UpdateTask {
                status: Some("done".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, "done");
    assert_eq!(updated.title, "Write docs");

    let details = state.projects.get(project.id).await.unwrap().unwrap();
    let tasks = details.tasks.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, "done");

    assert!(state.tasks.remove(task.id).await.unwrap());
    assert!(!state.tasks.remove(task.id).await.unwrap());
}

#[tokio::test]
async fn test_status_in_use_cannot_be_deleted() {
    let db = TestDatabase::new().await;
    let alice = db.create_test_user("alice").await;
    let state = state(&db);

    let project = state
        .projects
        .create(CreateProject {
            name: "Relaunch".to_string(),
            member_ids: vec![alice],
        })
        .await
        .unwrap();
    let todo = state
        .statuses
        .create(project.id, CreateStatus { name: "todo".to_string() })
        .await
        .unwrap();
    state
        .tasks
        .create(new_task("Write docs", project.id, "todo", alice))
        .await
        .unwrap();

    let err = assert_err(state.statuses.remove(todo.id).await, "delete used status");
    assert!(matches!(err, ProjectError::StatusInUse(id) if id == todo.id));
}

#[tokio::test]
async fn test_project_delete_cascades() {
    let db = TestDatabase::new().await;
    let alice = db.create_test_user("alice").await;
    let state = state(&db);
    let statuses = PgStatusRepository::new(db.connection());
    let tasks = PgTaskRepository::new(db.connection());

    let project = state
        .projects
        .create(CreateProject {
            name: "Relaunch".to_string(),
            member_ids: vec![alice],
        })
        .await
        .unwrap();
    state
        .statuses
        .create(project.id, CreateStatus { name: "todo".to_string() })
        .await
        .unwrap();
    let task = state
        .tasks
        .create(new_task("Write docs", project.id, "todo", alice))
        .await
        .unwrap();

    assert!(state.projects.remove(project.id).await.unwrap());
    assert!(!state.projects.remove(project.id).await.unwrap());

    assert!(statuses.get_by_foreign_key(project.id).await.unwrap().is_empty());
    assert!(tasks.get_by_id(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_end_date_before_start_date_is_rejected() {
    let db = TestDatabase::new().await;
    let alice = db.create_test_user("alice").await;
    let state = state(&db);

    let project = state
        .projects
        .create(CreateProject {
            name: "Relaunch".to_string(),
            member_ids: vec![alice],
        })
        .await
        .unwrap();
    state
        .statuses
        .create(project.id, CreateStatus { name: "todo".to_string() })
        .await
        .unwrap();

    let mut input = new_task("Backwards", project.id, "todo", alice);
    input.end_date = at(1, 8);

    let err = assert_err(state.tasks.create(input).await, "end before start");
    assert!(matches!(err, ProjectError::Validation(_)));
}

#[tokio::test]
async fn test_task_pointing_at_missing_rows_is_not_found() {
    let db = TestDatabase::new().await;
    let alice = db.create_test_user("alice").await;
    let projects = PgProjectRepository::new(db.connection());
    let statuses = PgStatusRepository::new(db.connection());
    let tasks = PgTaskRepository::new(db.connection());

    let project_id = projects
        .create(NewProject {
            name: "Relaunch".to_string(),
            member_ids: BTreeSet::from([alice]),
        })
        .await
        .unwrap();
    let status_id = statuses
        .create(NewStatus {
            name: "todo".to_string(),
            project_id,
        })
        .await
        .unwrap();

    let task = |status_id: i32, assigner_id: i32| NewTask {
        title: "Write docs".to_string(),
        description: String::new(),
        start_date: at(1, 9),
        end_date: at(3, 17),
        status_id,
        project_id,
        assigner_id,
    };

    let err = assert_err(tasks.create(task(status_id + 500, alice)).await, "status gone");
    assert!(matches!(err, ProjectError::StatusIdNotFound(id) if id == status_id + 500));

    let err = assert_err(tasks.create(task(status_id, alice + 500)).await, "assigner gone");
    assert!(matches!(err, ProjectError::UserNotFound(id) if id == alice + 500));

    let id = tasks.create(task(status_id, alice)).await.unwrap();
    let err = assert_err(
        tasks
            .update(
                id,
                TaskChanges {
                    status_id: Some(status_id + 500),
                    ..Default::default()
                },
            )
            .await,
        "moved to a missing status",
    );
    assert!(matches!(err, ProjectError::StatusIdNotFound(_)));
}

#[tokio::test]
async fn test_membership_of_missing_user_is_not_found() {
    let db = TestDatabase::new().await;
    let alice = db.create_test_user("alice").await;
    let repo = PgProjectRepository::new(db.connection());

    let err = assert_err(
        repo.create(NewProject {
            name: "Relaunch".to_string(),
            member_ids: BTreeSet::from([alice, alice + 500]),
        })
        .await,
        "member without user row",
    );
    assert!(matches!(err, ProjectError::UserNotFound(id) if id == alice + 500));
    assert!(repo.get_all().await.unwrap().is_empty());

    let id = repo
        .create(NewProject {
            name: "Relaunch".to_string(),
            member_ids: BTreeSet::from([alice]),
        })
        .await
        .unwrap();
    let err = assert_err(
        repo.update(
            id,
            ProjectChanges {
                name: None,
                member_ids: Some(BTreeSet::from([alice + 500])),
            },
        )
        .await,
        "replace with missing user",
    );
    assert!(matches!(err, ProjectError::UserNotFound(_)));

    let kept = repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(kept.member_ids, BTreeSet::from([alice]));
}
