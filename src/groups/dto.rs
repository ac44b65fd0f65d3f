use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::Group;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: String,
    pub user_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: Uuid,
    pub name: String,
    pub user_ids: Vec<Uuid>,
}

impl GroupResponse {
    pub fn from_parts(group: Group, user_ids: Vec<Uuid>) -> Self {
        Self {
            id: group.id,
            name: group.name,
            user_ids,
        }
    }
}
