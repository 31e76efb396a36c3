//! Prefixed ID generation for Kolekta entities.
//!
//! All IDs use a `ko_` brand prefix so they can never collide with
//! Przelewy24's numeric order ids or tokens.
//!
//! Format: `ko_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["ko_par_", "ko_pay_", "ko_goal_"];

/// Validate that a string is a valid Kolekta prefixed ID.
///
/// Cheap format check (`ko_{entity}_{32_hex_chars}`) to reject garbage
/// before hitting the database.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs in Kolekta.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Parish,
    Payment,
    FundraisingGoal,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Parish => "ko_par",
            Self::Payment => "ko_pay",
            Self::FundraisingGoal => "ko_goal",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

/// Generate the gateway correlation token for one donation attempt.
///
/// Not prefixed: this is the string Przelewy24 echoes back as `sessionId`,
/// so it stays plain 32-hex. Assigned once at initiation, never changed.
pub fn gen_session_id() -> String {
    Uuid::new_v4().as_simple().to_string()
}
