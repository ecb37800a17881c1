//! Key-value access to the `preferences` table.

use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Read one preference. Missing keys yield `None`.
    pub fn get_pref(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or overwrite one preference.
    pub fn set_pref(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO preferences (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// Write several preferences atomically.
    pub fn set_prefs(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO preferences (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete the given keys.  Returns how many rows were removed.
    pub fn remove_prefs(&mut self, keys: &[&str]) -> Result<usize> {
        let tx = self.conn_mut().transaction()?;
        let mut removed = 0;
        for key in keys {
            removed += tx.execute("DELETE FROM preferences WHERE key = ?1", params![key])?;
        }
        tx.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_overwrite() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get_pref("theme").unwrap(), None);

        db.set_pref("theme", "dark").unwrap();
        db.set_pref("theme", "light").unwrap();
        assert_eq!(db.get_pref("theme").unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_batch_write_and_remove() {
        let mut db = Database::open_in_memory().unwrap();
        db.set_prefs(&[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(db.get_pref("b").unwrap().as_deref(), Some("2"));

        assert_eq!(db.remove_prefs(&["a", "b", "missing"]).unwrap(), 2);
        assert_eq!(db.get_pref("a").unwrap(), None);
    }
}
