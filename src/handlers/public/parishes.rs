use axum::extract::State;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Path};
use crate::models::GoalProgress;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParishProfileResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub goals: Vec<GoalProgress>,
    /// Aggregated over completed payments - the ledger is the source of
    /// truth, no stored counters.
    pub total_raised_grosze: i64,
    pub donation_count: i64,
}

/// GET /api/parishes/{slug} - public parish profile with goal progress.
pub async fn parish_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ParishProfileResponse>> {
    let conn = state.db.get()?;

    let parish = queries::get_parish_by_slug(&conn, &slug)?
        .ok_or_else(|| AppError::NotFound("Parish not found".into()))?;

    let goals = queries::list_active_goals(&conn, &parish.id)?
        .into_iter()
        .map(|goal| {
            let raised = queries::sum_completed_for_goal(&conn, &goal.id)?;
            Ok(GoalProgress {
                id: goal.id,
                title: goal.title,
                description: goal.description,
                target_grosze: goal.target_grosze,
                raised_grosze: raised,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (total_raised_grosze, donation_count) =
        queries::parish_donation_stats(&conn, &parish.id)?;

    Ok(Json(ParishProfileResponse {
        id: parish.id,
        slug: parish.slug,
        name: parish.name,
        city: parish.city,
        description: parish.description,
        goals,
        total_raised_grosze,
        donation_count,
    }))
}
