use anyhow::Result;
use chrono::{SubsecRound, Utc};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};
use crate::models::{CreateTodoInput, TodoItem, UpdateTodoInput};

const SELECT_TODO: &str = "SELECT id, text, done, created_at FROM todo_items";

fn todo_from_row(row: &Row<'_>) -> rusqlite::Result<TodoItem> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    Ok(TodoItem {
        id: parse_uuid(0, &id)?,
        text: row.get(1)?,
        done: row.get(2)?,
        created_at: parse_timestamp(3, &created_at)?,
    })
}

impl Database {
    pub fn list_todos(&self) -> Result<Vec<TodoItem>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_at DESC, rowid DESC",
            SELECT_TODO
        ))?;
        let items = stmt
            .query_map([], todo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn get_todo(&self, id: Uuid) -> Result<Option<TodoItem>> {
        let conn = self.lock();
        let item = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_TODO),
                params![id.to_string()],
                todo_from_row,
            )
            .optional()?;
        Ok(item)
    }

    pub fn count_todos(&self) -> Result<usize> {
        let count: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM todo_items", [], |row| row.get(0))?;
        Ok(usize::try_from(count)?)
    }

    pub fn create_todo(&self, input: CreateTodoInput) -> Result<TodoItem> {
        let item = TodoItem {
            id: Uuid::new_v4(),
            text: input.text,
            done: input.done,
            // Stored timestamps keep microseconds.
            created_at: Utc::now().trunc_subsecs(6),
        };

        self.lock().execute(
            "INSERT INTO todo_items (id, text, done, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                item.id.to_string(),
                item.text,
                item.done,
                format_timestamp(&item.created_at)
            ],
        )?;
        tracing::debug!(id = %item.id, "created todo item");

        Ok(item)
    }

    /// Returns `None` when no item has the given id.
    pub fn update_todo(&self, id: Uuid, input: UpdateTodoInput) -> Result<Option<TodoItem>> {
        let changed = self.lock().execute(
            "UPDATE todo_items SET text = ?1, done = ?2 WHERE id = ?3",
            params![input.text, input.done, id.to_string()],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        tracing::debug!(%id, "updated todo item");
        self.get_todo(id)
    }

    pub fn delete_todo(&self, id: Uuid) -> Result<bool> {
        let changed = self
            .lock()
            .execute("DELETE FROM todo_items WHERE id = ?1", params![id.to_string()])?;
        if changed > 0 {
            tracing::debug!(%id, "deleted todo item");
        }
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn create(db: &Database, text: &str) -> TodoItem {
        db.create_todo(CreateTodoInput {
            text: text.into(),
            done: false,
        })
        .unwrap()
    }

    #[test]
    fn create_then_get() {
        let db = db();
        let item = create(&db, "buy milk");

        let fetched = db.get_todo(item.id).unwrap().unwrap();
        assert_eq!(fetched, item);
        assert!(!fetched.done);
    }

    #[test]
    fn created_item_matches_every_later_read() {
        let db = db();
        let item = create(&db, "stable");

        assert_eq!(item.created_at.timestamp_subsec_nanos() % 1_000, 0);
        assert_eq!(db.list_todos().unwrap(), vec![item.clone()]);
        assert_eq!(db.get_todo(item.id).unwrap().unwrap().created_at, item.created_at);
    }

    #[test]
    fn list_is_newest_first() {
        let db = db();
        let first = create(&db, "first");
        let second = create(&db, "second");

        let items = db.list_todos().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, second.id);
        assert_eq!(items[1].id, first.id);
    }

    #[test]
    fn update_keeps_created_at() {
        let db = db();
        let item = create(&db, "draft");

        let updated = db
            .update_todo(
                item.id,
                UpdateTodoInput {
                    text: "final".into(),
                    done: true,
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.text, "final");
        assert!(updated.done);
        assert_eq!(updated.created_at, item.created_at);
    }

    #[test]
    fn update_missing_returns_none() {
        let db = db();
        let result = db
            .update_todo(
                Uuid::new_v4(),
                UpdateTodoInput {
                    text: "x".into(),
                    done: false,
                },
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let db = db();
        let item = create(&db, "temp");

        assert!(db.delete_todo(item.id).unwrap());
        assert!(!db.delete_todo(item.id).unwrap());
        assert_eq!(db.count_todos().unwrap(), 0);
    }

    #[test]
    fn migrate_is_idempotent() {
        let db = db();
        create(&db, "survives");
        db.migrate().unwrap();
        assert_eq!(db.count_todos().unwrap(), 1);
    }

    #[test]
    fn file_database_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todo.db");

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        let item = create(&db, "on disk");
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.get_todo(item.id).unwrap().unwrap().text, "on disk");
    }
}
