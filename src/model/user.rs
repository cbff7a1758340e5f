use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 1,
        "name": "Jane Doe",
        "email": "employee@example.com",
        "role": "employee",
        "team": "Engineering",
        "joinDate": "2022-03-10"
    })
)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    /// argon2 PHC string, never leaves the server
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub team: String,
    #[schema(example = "2022-03-10", value_type = String, format = "date")]
    pub join_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub team: String,
    pub join_date: NaiveDate,
}

/// Profile fields a user may change about themselves.
///
/// `role`, `email` and anything else a client sends are dropped during
/// deserialization.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdates {
    #[schema(example = "Jane Q. Doe")]
    pub name: Option<String>,
    #[schema(example = "Platform")]
    pub team: Option<String>,
    #[schema(example = "2022-03-10", value_type = Option<String>, format = "date")]
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub team: Option<String>,
    pub join_date: Option<NaiveDate>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.team.is_none()
            && self.join_date.is_none()
            && self.password_hash.is_none()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(team) = self.team {
            user.team = team;
        }
        if let Some(join_date) = self.join_date {
            user.join_date = join_date;
        }
        if let Some(hash) = self.password_hash {
            user.password_hash = hash;
        }
    }
}
