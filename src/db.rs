use crate::paths::AppPaths;
use crate::Result;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn open(paths: &AppPaths) -> Result<Connection> {
    std::fs::create_dir_all(paths.db_dir())?;

    let conn = Connection::open_with_flags(
        paths.db_path(),
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
    )?;

    conn.busy_timeout(Duration::from_secs(10))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS kv_store (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL,
  updated_at_ms INTEGER NOT NULL
);
"#,
    )?;
    Ok(())
}

pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key=?1", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn put_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv_store(key, value, updated_at_ms) VALUES(?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at_ms=excluded.updated_at_ms",
        params![key, value, now_ms()],
    )?;
    Ok(())
}

pub fn delete_value(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM kv_store WHERE key=?1", [key])?;
    Ok(())
}

pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());

        {
            let conn = open(&paths).expect("open");
            migrate(&conn).expect("migrate");
            put_value(&conn, "nightMode", "true").expect("put");
            put_value(&conn, "nightMode", "false").expect("overwrite");
        }

        let conn = open(&paths).expect("reopen");
        migrate(&conn).expect("migrate again");
        assert_eq!(
            get_value(&conn, "nightMode").expect("get").as_deref(),
            Some("false")
        );
        assert_eq!(get_value(&conn, "missing").expect("get missing"), None);
    }

    #[test]
    fn delete_removes_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::new(dir.path().to_path_buf());
        let conn = open(&paths).expect("open");
        migrate(&conn).expect("migrate");

        put_value(&conn, "searchHistory", "[]").expect("put");
        delete_value(&conn, "searchHistory").expect("delete");
        delete_value(&conn, "searchHistory").expect("delete is idempotent");
        assert_eq!(get_value(&conn, "searchHistory").expect("get"), None);
    }
}
