/// DDL to create the schema_version tracking table.
///
/// Applied unconditionally on every DB open (before checking the version),
/// using `IF NOT EXISTS` so it is safe to run multiple times.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the v1 journal schema.
///
/// Two tables:
/// - `review_sessions`: one row per review session, keyed by UUID v4 text.
///   `ended_at` stays NULL until the session is finished.
/// - `decisions`: the latest status recorded for each correction in a
///   session. Re-deciding a correction overwrites its row.
///
/// All tables use `STRICT` mode. Deleting a session removes its decisions.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS review_sessions (
        id          TEXT    PRIMARY KEY,
        document    TEXT    NOT NULL,
        started_at  INTEGER NOT NULL,
        ended_at    INTEGER
    ) STRICT;

    CREATE TABLE IF NOT EXISTS decisions (
        session_id    TEXT    NOT NULL REFERENCES review_sessions(id) ON DELETE CASCADE,
        correction_id TEXT    NOT NULL,
        paragraph_id  TEXT    NOT NULL,
        change_type   TEXT    NOT NULL
                              CHECK(change_type IN ('addition','deletion','modification')),
        status        TEXT    NOT NULL
                              CHECK(status IN ('pending','applied','rejected','skipped')),
        decided_at    INTEGER NOT NULL,
        PRIMARY KEY (session_id, correction_id)
    ) STRICT;
";

/// Runs forward-only schema migration to the latest version.
///
/// Idempotent: safe to call on every open.
///
/// 1. Creates the `schema_version` table if it does not exist.
/// 2. Reads the current version (`0` if the table is empty).
/// 3. Below 1, applies `SCHEMA_V1_SQL` inside a `BEGIN IMMEDIATE`
///    transaction and records `version = 1`.
///
/// # Errors
///
/// Returns `rusqlite::Error` if the DDL fails or the version row cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
