//! Request bodies for the task routes
use serde::{Deserialize, Deserializer};

/// Distinguishes a key sent as `null` (`Some(None)`) from a missing key
/// (`None`). Use together with `#[serde(default)]`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub parent_task_id: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent_task_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddDependencyRequest {
    pub predecessor_task_id: Option<String>,
    #[serde(rename = "type")]
    pub dependency_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddCommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddAttachmentRequest {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_assignee_is_present() {
        let cleared: UpdateTaskRequest =
            serde_json::from_str(r#"{"assigned_to": null}"#).expect("parse");
        assert_eq!(cleared.assigned_to, Some(None));

        let untouched: UpdateTaskRequest = serde_json::from_str(r#"{"name": "x"}"#).expect("parse");
        assert_eq!(untouched.assigned_to, None);
        assert_eq!(untouched.parent_task_id, None);
    }

    #[test]
    fn test_dependency_type_key() {
        let req: AddDependencyRequest =
            serde_json::from_str(r#"{"predecessor_task_id": "abc", "type": "start_to_start"}"#)
                .expect("parse");
        assert_eq!(req.dependency_type.as_deref(), Some("start_to_start"));
    }
}
