pub mod models;
pub mod schema;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod utils;

pub use models::{
    Comment, Dependency, DependencyType, MemberRole, Notification, NotificationType, Project,
    ProjectMember, Task, TaskAttachment, TaskStatus, User,
};
pub use utils::{create_conn, run_migrations, DbPool};
