use serde::{Deserialize, Serialize};

/// Status of one donation attempt.
///
/// Starts at `Pending` and moves to exactly one terminal state. The guard
/// lives in `queries::apply_terminal_status`; nothing else writes `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One donation attempt. Rows are never deleted - this table is the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Gateway correlation token. Unique, assigned once, never changed.
    pub session_id: String,
    pub parish_id: String,
    /// Optional goal association; not enforced at write time, goal progress
    /// is computed by aggregation.
    pub goal_id: Option<String>,
    pub amount_grosze: i64,
    pub donor_name: Option<String>,
    pub donor_email: String,
    pub message: Option<String>,
    pub is_anonymous: bool,
    /// Method tag chosen by the donor; not validated against the gateway.
    pub payment_method: String,
    pub is_recurring: bool,
    pub recurring_frequency: Option<String>,
    pub status: PaymentStatus,
    /// Free-form JSON object. Accumulates gateway tokens, verification
    /// timestamps and an `events` audit array; merged additively, never
    /// replaced wholesale after creation.
    pub metadata: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Payment {
    pub fn metadata_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.metadata)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

/// Data required to persist a freshly registered donation attempt.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub session_id: String,
    pub parish_id: String,
    pub goal_id: Option<String>,
    pub amount_grosze: i64,
    pub donor_name: Option<String>,
    pub donor_email: String,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub payment_method: String,
    pub is_recurring: bool,
    pub recurring_frequency: Option<String>,
    /// Initial metadata (gateway token, redirect URL, registration time).
    pub metadata: serde_json::Value,
}

/// What a guarded terminal-status write actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Record was pending; the terminal status was written.
    Applied,
    /// Record already carried the same terminal status; metadata merged,
    /// status untouched (duplicate notification).
    AlreadyApplied,
    /// Record carries a different terminal status; the write was refused
    /// and the conflict flagged in metadata.
    Conflict(PaymentStatus),
}
