use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::create_id;
use super::now_millis;

pub const DEFAULT_PROJECT_NAME: &str = "General";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}

impl Project {
    pub fn new(name: &str) -> Project {
        return Project {
            id: create_id(),
            name: name.trim().to_string(),
            created_at: now_millis(),
        };
    }
}
