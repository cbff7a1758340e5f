use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_storage_name() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("Admin".parse::<Role>().is_err());
    }
}
