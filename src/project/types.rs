use serde::Deserialize;

/// Fields arrive as raw strings so missing or malformed values surface as
/// validation errors instead of body rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Absent fields are left untouched. An empty `description` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Option<String>,
    pub role: Option<String>,
}
