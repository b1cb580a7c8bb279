use grouplog_db::{open_database, run_migrations, DbRuntimeSettings};

#[test]
fn on_disk_database_survives_reopen() {
    let dir = tempfile::TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("relay.db");
    let path = path.to_str().expect("utf-8 path");

    {
        let pool = open_database(path, DbRuntimeSettings::default()).expect("failed to open");
        let conn = pool.get().expect("failed to get connection");
        conn.execute(
            "INSERT INTO events (id, pubkey, kind, created_at, tags_json, group_id)
             VALUES ('abc', 'pk', 9007, 10, '[[\"h\",\"pizza\"]]', 'pizza')",
            [],
        )
        .expect("failed to insert event");
    }

    let pool = open_database(path, DbRuntimeSettings::default()).expect("failed to reopen");
    let conn = pool.get().expect("failed to get connection");
    assert_eq!(run_migrations(&conn).expect("migrations"), 0);

    let group: String = conn
        .query_row("SELECT group_id FROM events WHERE id = 'abc'", [], |row| {
            row.get(0)
        })
        .expect("event should persist");
    assert_eq!(group, "pizza");

    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name")
        .expect("failed to prepare table query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to list tables")
        .map(|r| r.expect("failed to read table name"))
        .collect();
    assert_eq!(tables, vec!["_grouplog_migrations", "events"]);
}
