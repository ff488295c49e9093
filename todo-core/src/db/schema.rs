pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS todo_items (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0 CHECK (done IN (0, 1)),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_todo_items_created ON todo_items(created_at);
"#;
