//! Database migrations
//!
//! Schema changes are additive only: tables are created when missing and
//! any column an older database lacks is added in place.

use rusqlite::Connection;
use tracing::info;

use super::db::DatabaseError;

const CURRENT_VERSION: i32 = 2;

/// Optional columns of `books`, in table order
const BOOK_COLUMNS: &[(&str, &str)] = &[
    ("author", "TEXT"),
    ("year", "TEXT"),
    ("notes", "TEXT"),
    ("cover", "TEXT"),
];

/// Optional columns of `wishlist`, in table order
const WISHLIST_COLUMNS: &[(&str, &str)] = &[("notes", "TEXT"), ("cover", "TEXT")];

/// Run all pending migrations
///
/// # Errors
/// Returns an error if migrations fail
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        migrate_v1(conn)?;
    }

    // v2 added covers; older files may also predate other columns
    ensure_columns(conn, "books", BOOK_COLUMNS)?;
    ensure_columns(conn, "wishlist", WISHLIST_COLUMNS)?;

    if version < CURRENT_VERSION {
        conn.pragma_update(None, "user_version", CURRENT_VERSION)?;
    }
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        r"
        -- Owned items
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT,
            year TEXT,
            notes TEXT,
            cover TEXT
        );

        -- Desired items
        CREATE TABLE IF NOT EXISTS wishlist (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            notes TEXT,
            cover TEXT
        );
        ",
    )?;

    Ok(())
}

/// Add every column in `columns` that `table` is missing
fn ensure_columns(
    conn: &Connection,
    table: &str,
    columns: &[(&str, &str)],
) -> Result<(), DatabaseError> {
    let existing = table_columns(conn, table)?;
    if existing.is_empty() {
        return Err(DatabaseError::Migration(format!("Table not found: {table}")));
    }

    for (name, sql_type) in columns {
        if !existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {name} {sql_type}"))?;
            info!(table, column = name, "added missing column");
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn test_fresh_database_has_all_columns() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let books = table_columns(&conn, "books").unwrap();
        assert_eq!(books, vec!["id", "title", "author", "year", "notes", "cover"]);
        let wishlist = table_columns(&conn, "wishlist").unwrap();
        assert_eq!(wishlist, vec!["id", "title", "notes", "cover"]);
    }

    #[test]
    fn test_adds_missing_cover_columns_without_losing_rows() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r"
            CREATE TABLE books (id INTEGER PRIMARY KEY, title TEXT NOT NULL, author TEXT, year TEXT, notes TEXT);
            CREATE TABLE wishlist (id INTEGER PRIMARY KEY, title TEXT NOT NULL, notes TEXT);
            INSERT INTO books (title, author) VALUES ('Berserk', 'Kentaro Miura');
            INSERT INTO wishlist (title) VALUES ('Vagabond');
            ",
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        assert!(table_columns(&conn, "books").unwrap().contains(&"cover".to_string()));
        assert!(table_columns(&conn, "wishlist").unwrap().contains(&"cover".to_string()));

        let (title, cover): (String, Option<String>) = conn
            .query_row("SELECT title, cover FROM books WHERE id = ?1", params![1], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(title, "Berserk");
        assert_eq!(cover, None);

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(table_columns(&conn, "books").unwrap().len(), 6);
    }
}
