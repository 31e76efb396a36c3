use chrono::Utc;
use rusqlite::{params, Connection, TransactionBehavior};

use crate::db::from_row::{query_all, query_one, GOAL_COLS, PARISH_COLS, PAYMENT_COLS};
use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Parishes ============

pub fn create_parish(conn: &Connection, input: &CreateParish) -> Result<Parish> {
    let id = EntityType::Parish.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO parishes (id, slug, name, city, description, contact_email, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            &id,
            &input.slug,
            &input.name,
            &input.city,
            &input.description,
            &input.contact_email,
            now
        ],
    )?;

    Ok(Parish {
        id,
        slug: input.slug.clone(),
        name: input.name.clone(),
        city: input.city.clone(),
        description: input.description.clone(),
        contact_email: input.contact_email.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_parish_by_id(conn: &Connection, id: &str) -> Result<Option<Parish>> {
    query_one(
        conn,
        &format!("SELECT {} FROM parishes WHERE id = ?1", PARISH_COLS),
        &[&id],
    )
}

pub fn get_parish_by_slug(conn: &Connection, slug: &str) -> Result<Option<Parish>> {
    query_one(
        conn,
        &format!("SELECT {} FROM parishes WHERE slug = ?1", PARISH_COLS),
        &[&slug],
    )
}

/// Bump a parish's updated_at. Hook for aggregate-statistics invalidation
/// after a completed donation; callers treat failures as non-fatal.
pub fn touch_parish(conn: &Connection, id: &str) -> Result<()> {
    conn.execute(
        "UPDATE parishes SET updated_at = ?1 WHERE id = ?2",
        params![now(), id],
    )?;
    Ok(())
}

// ============ Fundraising goals ============

pub fn create_fundraising_goal(
    conn: &Connection,
    parish_id: &str,
    input: &CreateFundraisingGoal,
) -> Result<FundraisingGoal> {
    let id = EntityType::FundraisingGoal.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO fundraising_goals (id, parish_id, title, description, target_grosze, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
        params![
            &id,
            parish_id,
            &input.title,
            &input.description,
            input.target_grosze,
            now
        ],
    )?;

    Ok(FundraisingGoal {
        id,
        parish_id: parish_id.to_string(),
        title: input.title.clone(),
        description: input.description.clone(),
        target_grosze: input.target_grosze,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

pub fn list_active_goals(conn: &Connection, parish_id: &str) -> Result<Vec<FundraisingGoal>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM fundraising_goals WHERE parish_id = ?1 AND is_active = 1
             ORDER BY created_at",
            GOAL_COLS
        ),
        &[&parish_id],
    )
}

/// Sum of completed payments attributed to a goal. The ledger is the single
/// source of truth for progress; nothing increments a counter.
pub fn sum_completed_for_goal(conn: &Connection, goal_id: &str) -> Result<i64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount_grosze), 0) FROM payments
         WHERE goal_id = ?1 AND status = 'completed'",
        params![goal_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

/// Aggregate donation stats for a parish: (total grosze, completed count).
pub fn parish_donation_stats(conn: &Connection, parish_id: &str) -> Result<(i64, i64)> {
    let stats = conn.query_row(
        "SELECT COALESCE(SUM(amount_grosze), 0), COUNT(*) FROM payments
         WHERE parish_id = ?1 AND status = 'completed'",
        params![parish_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(stats)
}

// ============ Payments ============

pub fn create_payment(conn: &Connection, input: &NewPayment) -> Result<Payment> {
    let id = EntityType::Payment.gen_id();
    let now = now();
    let metadata = input.metadata.to_string();

    conn.execute(
        "INSERT INTO payments (id, session_id, parish_id, goal_id, amount_grosze, donor_name,
             donor_email, message, is_anonymous, payment_method, is_recurring,
             recurring_frequency, status, metadata, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'pending', ?13, ?14, ?14)",
        params![
            &id,
            &input.session_id,
            &input.parish_id,
            &input.goal_id,
            input.amount_grosze,
            &input.donor_name,
            &input.donor_email,
            &input.message,
            input.is_anonymous as i64,
            &input.payment_method,
            input.is_recurring as i64,
            &input.recurring_frequency,
            &metadata,
            now
        ],
    )?;

    Ok(Payment {
        id,
        session_id: input.session_id.clone(),
        parish_id: input.parish_id.clone(),
        goal_id: input.goal_id.clone(),
        amount_grosze: input.amount_grosze,
        donor_name: input.donor_name.clone(),
        donor_email: input.donor_email.clone(),
        message: input.message.clone(),
        is_anonymous: input.is_anonymous,
        payment_method: input.payment_method.clone(),
        is_recurring: input.is_recurring,
        recurring_frequency: input.recurring_frequency.clone(),
        status: PaymentStatus::Pending,
        metadata,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_payment_by_id(conn: &Connection, id: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLS),
        &[&id],
    )
}

pub fn get_payment_by_session(conn: &Connection, session_id: &str) -> Result<Option<Payment>> {
    query_one(
        conn,
        &format!("SELECT {} FROM payments WHERE session_id = ?1", PAYMENT_COLS),
        &[&session_id],
    )
}

/// Shallow-additive merge of `patch` into the stored metadata object, plus
/// an appended entry in its `events` array recording the notification.
fn merge_metadata(existing: &str, patch: &serde_json::Value, event: &str, at: i64) -> String {
    let mut root: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(existing).unwrap_or_default();

    if let Some(obj) = patch.as_object() {
        for (k, v) in obj {
            root.insert(k.clone(), v.clone());
        }
    }

    let mut entry = serde_json::Map::new();
    entry.insert("event".into(), event.into());
    entry.insert("at".into(), at.into());
    if let Some(obj) = patch.as_object() {
        for (k, v) in obj {
            entry.insert(k.clone(), v.clone());
        }
    }

    let events = root
        .entry("events")
        .or_insert_with(|| serde_json::Value::Array(vec![]));
    if let Some(arr) = events.as_array_mut() {
        arr.push(serde_json::Value::Object(entry));
    }

    serde_json::Value::Object(root).to_string()
}

/// Guarded terminal-status transition for a payment.
///
/// Runs as one IMMEDIATE transaction so the read-modify-write of the
/// metadata bag cannot lose updates to a concurrent callback/webhook writer.
/// Only `pending -> terminal` writes the status; a matching terminal state
/// re-merges metadata (idempotent duplicate delivery); a conflicting one is
/// refused and flagged in metadata instead of silently overwritten.
pub fn apply_terminal_status(
    conn: &mut Connection,
    payment_id: &str,
    new_status: PaymentStatus,
    patch: &serde_json::Value,
    event: &str,
) -> Result<TransitionOutcome> {
    debug_assert!(new_status.is_terminal());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let at = now();

    let (current_raw, metadata): (String, String) = tx.query_row(
        "SELECT status, metadata FROM payments WHERE id = ?1",
        params![payment_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let current = PaymentStatus::from_str(&current_raw)
        .ok_or_else(|| crate::error::AppError::Internal(format!(
            "payment {} has invalid status '{}'",
            payment_id, current_raw
        )))?;

    let outcome = match current {
        PaymentStatus::Pending => {
            let merged = merge_metadata(&metadata, patch, event, at);
            tx.execute(
                "UPDATE payments SET status = ?1, metadata = ?2, updated_at = ?3 WHERE id = ?4",
                params![new_status.as_str(), &merged, at, payment_id],
            )?;
            TransitionOutcome::Applied
        }
        current if current == new_status => {
            let merged = merge_metadata(&metadata, patch, event, at);
            tx.execute(
                "UPDATE payments SET metadata = ?1, updated_at = ?2 WHERE id = ?3",
                params![&merged, at, payment_id],
            )?;
            TransitionOutcome::AlreadyApplied
        }
        current => {
            tracing::warn!(
                payment_id = %payment_id,
                existing = %current,
                incoming = %new_status,
                source = event,
                "conflicting terminal status notification; keeping existing status"
            );
            let conflict = serde_json::json!({
                "status_conflict": {
                    "existing": current.as_str(),
                    "incoming": new_status.as_str(),
                    "source": event,
                }
            });
            let merged = merge_metadata(&metadata, &conflict, "status_conflict", at);
            tx.execute(
                "UPDATE payments SET metadata = ?1, updated_at = ?2 WHERE id = ?3",
                params![&merged, at, payment_id],
            )?;
            TransitionOutcome::Conflict(current)
        }
    };

    tx.commit()?;
    Ok(outcome)
}
