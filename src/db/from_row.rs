//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum, converting parse errors to rusqlite
/// errors instead of panicking on corrupted rows.
fn parse_status(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<PaymentStatus> {
    let raw: String = row.get(col)?;
    PaymentStatus::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const PARISH_COLS: &str =
    "id, slug, name, city, description, contact_email, created_at, updated_at";

pub const GOAL_COLS: &str =
    "id, parish_id, title, description, target_grosze, is_active, created_at, updated_at";

pub const PAYMENT_COLS: &str = "id, session_id, parish_id, goal_id, amount_grosze, donor_name, \
     donor_email, message, is_anonymous, payment_method, is_recurring, recurring_frequency, \
     status, metadata, created_at, updated_at";

impl FromRow for Parish {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Parish {
            id: row.get(0)?,
            slug: row.get(1)?,
            name: row.get(2)?,
            city: row.get(3)?,
            description: row.get(4)?,
            contact_email: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for FundraisingGoal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(FundraisingGoal {
            id: row.get(0)?,
            parish_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            target_grosze: row.get(4)?,
            is_active: row.get::<_, i64>(5)? != 0,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            session_id: row.get(1)?,
            parish_id: row.get(2)?,
            goal_id: row.get(3)?,
            amount_grosze: row.get(4)?,
            donor_name: row.get(5)?,
            donor_email: row.get(6)?,
            message: row.get(7)?,
            is_anonymous: row.get::<_, i64>(8)? != 0,
            payment_method: row.get(9)?,
            is_recurring: row.get::<_, i64>(10)? != 0,
            recurring_frequency: row.get(11)?,
            status: parse_status(row, 12, "status")?,
            metadata: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }
}
