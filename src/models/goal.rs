use serde::{Deserialize, Serialize};

/// A fundraising goal for a parish.
///
/// There is no stored `current_amount` counter: progress is recomputed by
/// aggregation over completed payments on every read, so the ledger is the
/// single source of truth and there is nothing to keep in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundraisingGoal {
    pub id: String,
    pub parish_id: String,
    pub title: String,
    pub description: Option<String>,
    pub target_grosze: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFundraisingGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub target_grosze: i64,
}

/// Read model: goal plus its aggregated progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_grosze: i64,
    /// Sum of completed payments associated with this goal.
    pub raised_grosze: i64,
}
