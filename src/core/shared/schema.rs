diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    projects (id) {
        id -> Uuid,
        name -> Text,
        description -> Text,
        start_date -> Date,
        end_date -> Date,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    project_members (project_id, user_id) {
        project_id -> Uuid,
        user_id -> Uuid,
        role -> Text,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Uuid,
        project_id -> Uuid,
        parent_task_id -> Nullable<Uuid>,
        name -> Text,
        description -> Text,
        start_date -> Date,
        end_date -> Date,
        assigned_to -> Nullable<Uuid>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    dependencies (id) {
        id -> Uuid,
        predecessor_task_id -> Uuid,
        successor_task_id -> Uuid,
        dependency_type -> Text,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        task_id -> Uuid,
        user_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    task_attachments (id) {
        id -> Uuid,
        task_id -> Uuid,
        file_name -> Text,
        file_path -> Text,
        uploaded_by -> Uuid,
        uploaded_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        message -> Text,
        notification_type -> Text,
        is_read -> Bool,
        created_at -> Timestamptz,
        related_entity_id -> Nullable<Uuid>,
    }
}

diesel::joinable!(projects -> users (owner_id));
diesel::joinable!(project_members -> projects (project_id));
diesel::joinable!(project_members -> users (user_id));
diesel::joinable!(tasks -> projects (project_id));
diesel::joinable!(comments -> tasks (task_id));
diesel::joinable!(task_attachments -> tasks (task_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    projects,
    project_members,
    tasks,
    dependencies,
    comments,
    task_attachments,
    notifications,
);
