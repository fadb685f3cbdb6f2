use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::core::shared::models::{MemberRole, Project, ProjectMember, Task, TaskStatus, User};
use crate::core::storage::Repository;

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("test date")
}

pub fn seed_user(repo: &mut dyn Repository, username: &str) -> User {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: String::new(),
        created_at: now,
        updated_at: now,
    };
    repo.insert_user(&user).expect("seed user");
    user
}

pub fn seed_project(repo: &mut dyn Repository, owner_id: Uuid, name: &str) -> Project {
    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: String::new(),
        start_date: date("2024-01-01"),
        end_date: date("2024-06-01"),
        owner_id,
        created_at: now,
        updated_at: now,
    };
    repo.insert_project(&project).expect("seed project");
    project
}

pub fn seed_member(repo: &mut dyn Repository, project_id: Uuid, user_id: Uuid) {
    repo.insert_member(&ProjectMember {
        project_id,
        user_id,
        role: MemberRole::Member,
        joined_at: Utc::now(),
    })
    .expect("seed member");
}

pub fn seed_task(repo: &mut dyn Repository, project_id: Uuid, name: &str) -> Task {
    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        project_id,
        parent_task_id: None,
        name: name.to_string(),
        description: String::new(),
        start_date: date("2024-01-02"),
        end_date: date("2024-01-10"),
        assigned_to: None,
        status: TaskStatus::NotStarted,
        created_at: now,
        updated_at: now,
    };
    repo.insert_task(&task).expect("seed task");
    task
}
