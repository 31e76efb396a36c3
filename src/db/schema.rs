use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Parishes (donation targets with a public profile)
        CREATE TABLE IF NOT EXISTS parishes (
            id TEXT PRIMARY KEY,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            description TEXT,
            contact_email TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_parishes_slug ON parishes(slug);

        -- Fundraising goals. No current_amount column: progress is
        -- recomputed from completed payments on read.
        CREATE TABLE IF NOT EXISTS fundraising_goals (
            id TEXT PRIMARY KEY,
            parish_id TEXT NOT NULL REFERENCES parishes(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            target_grosze INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_goals_parish ON fundraising_goals(parish_id);

        -- Payments (one donation attempt each). Historical ledger: rows are
        -- never deleted. session_id is the gateway correlation key.
        CREATE TABLE IF NOT EXISTS payments (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL UNIQUE,
            parish_id TEXT NOT NULL REFERENCES parishes(id),
            goal_id TEXT REFERENCES fundraising_goals(id),
            amount_grosze INTEGER NOT NULL CHECK (amount_grosze > 0),
            donor_name TEXT,
            donor_email TEXT NOT NULL,
            message TEXT,
            is_anonymous INTEGER NOT NULL DEFAULT 0,
            payment_method TEXT NOT NULL,
            is_recurring INTEGER NOT NULL DEFAULT 0,
            recurring_frequency TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'completed', 'failed', 'cancelled')),
            metadata TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_session ON payments(session_id);
        CREATE INDEX IF NOT EXISTS idx_payments_parish ON payments(parish_id);
        CREATE INDEX IF NOT EXISTS idx_payments_goal_completed
            ON payments(goal_id) WHERE status = 'completed';
        "#,
    )
}
