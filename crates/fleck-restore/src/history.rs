use crate::provider::BrowserTabProvider;
use fleck_core::{webkit_to_unix, BrowserTab};
use fleck_store::BrowserSpec;
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashSet;

/// Reads recent pages from a Chromium-family `History` database.
///
/// The browser keeps the database locked while running, so it is copied to
/// a temporary directory and queried there.
#[derive(Debug, Clone)]
pub struct ChromiumHistory {
    limit: usize,
}

impl ChromiumHistory {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl BrowserTabProvider for ChromiumHistory {
    fn recent_tabs(&self, browser: &BrowserSpec, task: &str) -> anyhow::Result<Vec<BrowserTab>> {
        let Some(db) = browser.history_path.as_deref() else {
            return Ok(Vec::new());
        };
        if !db.is_file() {
            tracing::debug!(browser = %browser.id, path = %db.display(), "no history database");
            return Ok(Vec::new());
        }

        let tmp = tempfile::tempdir()?;
        let copy = tmp.path().join("History");
        std::fs::copy(db, &copy)?;
        let conn = Connection::open_with_flags(&copy, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let tabs = read_recent(&conn, self.limit)?;
        tracing::debug!(browser = %browser.id, task, count = tabs.len(), "history read");
        Ok(tabs)
    }
}

/// Most recently visited URLs, newest first, one per page title.
pub fn read_recent(conn: &Connection, limit: usize) -> anyhow::Result<Vec<BrowserTab>> {
    let mut stmt = conn.prepare(
        "SELECT url, title, last_visit_time FROM urls \
         ORDER BY last_visit_time DESC \
         LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit as i64], |row| {
        let title: Option<String> = row.get(1)?;
        let visited: Option<i64> = row.get(2)?;
        Ok(BrowserTab {
            url: row.get(0)?,
            title: title.unwrap_or_default(),
            visited_at: webkit_to_unix(visited.unwrap_or(0)),
        })
    })?;

    let mut seen = HashSet::new();
    let mut tabs = Vec::new();
    for row in rows {
        let tab = row?;
        let key = if tab.title.is_empty() {
            tab.url.clone()
        } else {
            tab.title.clone()
        };
        if seen.insert(key) {
            tabs.push(tab);
        }
    }
    Ok(tabs)
}
