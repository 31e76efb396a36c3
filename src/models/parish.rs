use serde::{Deserialize, Serialize};

/// A parish - the donation-receiving entity with a public profile.
/// Profile editing happens elsewhere; the payment flow only reads
/// name/city (gateway transaction description) and slug (redirect URLs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parish {
    pub id: String,
    /// URL-safe identifier used in frontend routes (`/{slug}/wsparcie/...`).
    pub slug: String,
    pub name: String,
    pub city: String,
    pub description: Option<String>,
    pub contact_email: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Parish {
    /// Human-readable transaction description shown in the gateway UI.
    pub fn donation_description(&self) -> String {
        format!("Darowizna na rzecz {}, {}", self.name, self.city)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateParish {
    pub slug: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}
