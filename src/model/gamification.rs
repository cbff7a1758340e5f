use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Badge {
    #[schema(example = "b1")]
    pub id: String,
    #[schema(example = "Punctuality Pro")]
    pub name: String,
    #[schema(example = "Checked in on time 5 days in a row")]
    pub description: String,
    #[schema(example = "clock")]
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GamificationProgress {
    pub points: u32,
    pub badges: Vec<Badge>,
    /// null until the employee is ranked
    pub leaderboard_rank: Option<u32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GamificationSettings {
    #[schema(example = 10)]
    pub points_for_punctuality: u32,
    #[schema(example = 50)]
    pub points_for_perfect_week: u32,
}

impl Default for GamificationSettings {
    fn default() -> Self {
        Self {
            points_for_punctuality: 10,
            points_for_perfect_week: 50,
        }
    }
}
