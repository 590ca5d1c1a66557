//! SQLite-backed cookie persistence.
//!
//! Stores one row per cookie in a schema patterned after Chromium's
//! `net/extras/sqlite` cookie database: host key, name, path uniquely
//! identify a cookie, timestamps are Unix seconds, and SameSite/priority
//! are stored as small integers.

use crate::cookies::canonicalcookie::{CanonicalCookie, CookiePriority, SameSite};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cookies (
    host_key TEXT NOT NULL,
    name TEXT NOT NULL,
    value TEXT NOT NULL,
    path TEXT NOT NULL,
    creation_utc INTEGER NOT NULL,
    expires_utc INTEGER,
    last_access_utc INTEGER NOT NULL,
    secure INTEGER NOT NULL,
    httponly INTEGER NOT NULL,
    host_only INTEGER NOT NULL,
    samesite INTEGER NOT NULL,
    priority INTEGER NOT NULL,
    UNIQUE(host_key, name, path)
)";

fn samesite_to_int(s: SameSite) -> i32 {
    match s {
        SameSite::Unspecified => -1,
        SameSite::NoRestriction => 0,
        SameSite::Lax => 1,
        SameSite::Strict => 2,
    }
}

fn samesite_from_int(v: i32) -> SameSite {
    match v {
        0 => SameSite::NoRestriction,
        1 => SameSite::Lax,
        2 => SameSite::Strict,
        _ => SameSite::Unspecified,
    }
}

fn priority_to_int(p: CookiePriority) -> i32 {
    match p {
        CookiePriority::Low => 0,
        CookiePriority::Medium => 1,
        CookiePriority::High => 2,
    }
}

fn priority_from_int(v: i32) -> CookiePriority {
    match v {
        0 => CookiePriority::Low,
        2 => CookiePriority::High,
        _ => CookiePriority::Medium,
    }
}

/// On-disk cookie store; the jar writes through on every mutation.
pub struct SqlitePersistentCookieStore {
    conn: Mutex<Connection>,
    path: PathBuf,
}

impl SqlitePersistentCookieStore {
    /// Open (or create) the store at `path`, creating parent directories
    /// as needed.
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        if let Some(parent) = path.parent() {
            // Directory creation failures surface as the subsequent open error.
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all persisted cookies, skipping ones that expired on disk.
    pub fn load(&self) -> rusqlite::Result<Vec<CanonicalCookie>> {
        let conn = self.conn.lock().expect("cookie store poisoned");
        let mut stmt = conn.prepare(
            "SELECT host_key, name, value, path, creation_utc, expires_utc, last_access_utc,
                    secure, httponly, host_only, samesite, priority
             FROM cookies",
        )?;

        let now = OffsetDateTime::now_utc();
        let rows = stmt.query_map([], |row| {
            let creation_secs: i64 = row.get(4)?;
            let expires_secs: Option<i64> = row.get(5)?;
            let last_access_secs: i64 = row.get(6)?;

            Ok(CanonicalCookie {
                domain: row.get(0)?,
                name: row.get(1)?,
                value: row.get(2)?,
                path: row.get(3)?,
                creation_time: OffsetDateTime::from_unix_timestamp(creation_secs)
                    .unwrap_or(now),
                expiration_time: expires_secs
                    .and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok()),
                last_access_time: OffsetDateTime::from_unix_timestamp(last_access_secs)
                    .unwrap_or(now),
                secure: row.get::<_, i32>(7)? != 0,
                http_only: row.get::<_, i32>(8)? != 0,
                host_only: row.get::<_, i32>(9)? != 0,
                same_site: samesite_from_int(row.get(10)?),
                priority: priority_from_int(row.get(11)?),
            })
        })?;

        let mut cookies = Vec::new();
        for row in rows {
            let cookie = row?;
            if cookie.is_expired(now) {
                continue;
            }
            cookies.push(cookie);
        }
        Ok(cookies)
    }

    /// Insert or replace one cookie row.
    pub fn add(&self, cookie: &CanonicalCookie) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("cookie store poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO cookies
                (host_key, name, value, path, creation_utc, expires_utc, last_access_utc,
                 secure, httponly, host_only, samesite, priority)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                cookie.domain,
                cookie.name,
                cookie.value,
                cookie.path,
                cookie.creation_time.unix_timestamp(),
                cookie.expiration_time.map(|t| t.unix_timestamp()),
                cookie.last_access_time.unix_timestamp(),
                cookie.secure as i32,
                cookie.http_only as i32,
                cookie.host_only as i32,
                samesite_to_int(cookie.same_site),
                priority_to_int(cookie.priority),
            ],
        )?;
        Ok(())
    }

    /// Delete one cookie row, if present.
    pub fn delete(&self, cookie: &CanonicalCookie) -> rusqlite::Result<()> {
        let conn = self.conn.lock().expect("cookie store poisoned");
        conn.execute(
            "DELETE FROM cookies WHERE host_key = ?1 AND name = ?2 AND path = ?3",
            params![cookie.domain, cookie.name, cookie.path],
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for SqlitePersistentCookieStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlitePersistentCookieStore")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::Duration;

    fn cookie(name: &str, value: &str) -> CanonicalCookie {
        CanonicalCookie::new(
            name.to_string(),
            value.to_string(),
            "example.com".to_string(),
            "/".to_string(),
            OffsetDateTime::now_utc(),
            Some(OffsetDateTime::now_utc() + Duration::days(7)),
        )
    }

    #[test]
    fn test_add_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cookies");

        let store = SqlitePersistentCookieStore::open(&path).unwrap();
        store.add(&cookie("session", "abc123")).unwrap();
        drop(store);

        let reopened = SqlitePersistentCookieStore::open(&path).unwrap();
        let cookies = reopened.load().unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "session");
        assert_eq!(cookies[0].value, "abc123");
    }

    #[test]
    fn test_replace_on_same_key() {
        let dir = tempdir().unwrap();
        let store = SqlitePersistentCookieStore::open(&dir.path().join("Cookies")).unwrap();

        store.add(&cookie("session", "first")).unwrap();
        store.add(&cookie("session", "second")).unwrap();

        let cookies = store.load().unwrap();
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].value, "second");
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = SqlitePersistentCookieStore::open(&dir.path().join("Cookies")).unwrap();

        let c = cookie("session", "abc");
        store.add(&c).unwrap();
        store.delete(&c).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_expired_cookies_skipped_on_load() {
        let dir = tempdir().unwrap();
        let store = SqlitePersistentCookieStore::open(&dir.path().join("Cookies")).unwrap();

        let mut c = cookie("old", "x");
        c.expiration_time = Some(OffsetDateTime::now_utc() - Duration::hours(1));
        store.add(&c).unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("profile").join("Cookies");
        let store = SqlitePersistentCookieStore::open(&nested).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
