use crate::model::{self, ClassData};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE_NAME: &str = "gradebook.sqlite3";

/// Well-known key holding the whole class as one JSON blob.
pub const CLASS_DATA_KEY: &str = "gradebook.classData";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    // Workspaces written before timestamps were tracked.
    ensure_kv_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_kv_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "kv", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE kv ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Loads the stored class, seeding (and saving) the demo class on first use.
/// A blob that no longer decodes is an error, never a silent reseed.
pub fn load_class_data(conn: &Connection) -> anyhow::Result<ClassData> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM kv WHERE key = ?", [CLASS_DATA_KEY], |r| {
            r.get(0)
        })
        .optional()
        .context("failed to read class data")?;

    match raw {
        Some(text) => serde_json::from_str(&text).context("stored class data is invalid JSON"),
        None => {
            let seeded = model::seed_class_data();
            save_class_data(conn, &seeded)?;
            tracing::info!(
                students = seeded.students.len(),
                "seeded default class into empty workspace"
            );
            Ok(seeded)
        }
    }
}

pub fn save_class_data(conn: &Connection, data: &ClassData) -> anyhow::Result<()> {
    let text = serde_json::to_string(data).context("failed to serialize class data")?;
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO kv(key, value, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        (CLASS_DATA_KEY, &text, &now),
    )
    .context("failed to write class data")?;
    Ok(())
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, &text),
    )?;
    Ok(())
}
