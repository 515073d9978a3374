//! # Schema Dump Engine
//!
//! Emits a SQL script that recreates the database's schema and content,
//! wrapped in a transaction and resilient to catalog corruption: any query
//! that fails with a corruption error is retried exactly once with
//! `ORDER BY rowid DESC` appended, which can recover rows a forward scan
//! cannot reach.
//!
//! Internal `sqlite_*` objects are never replayed literally: the sequence
//! table becomes a `DELETE` preamble before its rows, the statistics table
//! becomes an `ANALYZE` marker, and virtual-table definitions are rewritten
//! as direct catalog inserts inside a `writable_schema` window so the dump
//! restores without invoking the module.

use std::io::Write;

use eyre::{eyre, Result};
use rusqlite::{Connection, ErrorCode, ToSql};

use crate::exec::cells_from_row;
use crate::render::{escape_single_quotes, quote_ident, sql_quote};
use crate::session::Session;

struct DumpState {
    writable_schema: bool,
    errors: usize,
}

/// Write a script recreating every object (and its content) whose table name
/// matches one of `patterns`, or the whole database when none are given.
pub fn dump_database(conn: &Connection, session: &mut Session, patterns: &[String]) -> Result<()> {
    // Replayed content may violate immediate foreign keys, so enforcement is
    // off for the whole script.
    writeln!(session.out, "PRAGMA foreign_keys=OFF;")?;
    writeln!(session.out, "BEGIN TRANSACTION;")?;
    let _ = conn.execute_batch("SAVEPOINT dump; PRAGMA writable_schema=ON");
    let mut state = DumpState {
        writable_schema: false,
        errors: 0,
    };

    if patterns.is_empty() {
        schema_dump_query(
            conn,
            session,
            &mut state,
            "SELECT name, type, sql FROM sqlite_master \
             WHERE sql NOT NULL AND type=='table' AND name!='sqlite_sequence'",
            None,
        );
        schema_dump_query(
            conn,
            session,
            &mut state,
            "SELECT name, type, sql FROM sqlite_master WHERE name=='sqlite_sequence'",
            None,
        );
        let _ = table_dump_query(
            conn,
            session,
            &mut state,
            "SELECT sql FROM sqlite_master \
             WHERE sql NOT NULL AND type IN ('index','trigger','view')",
            &[],
            None,
        );
    } else {
        for pattern in patterns {
            schema_dump_query(
                conn,
                session,
                &mut state,
                "SELECT name, type, sql FROM sqlite_master \
                 WHERE tbl_name LIKE ?1 AND type=='table' AND sql NOT NULL",
                Some(pattern),
            );
            let _ = table_dump_query(
                conn,
                session,
                &mut state,
                "SELECT sql FROM sqlite_master \
                 WHERE sql NOT NULL AND type IN ('index','trigger','view') \
                 AND tbl_name LIKE ?1",
                &[pattern],
                None,
            );
        }
    }

    if state.writable_schema {
        writeln!(session.out, "PRAGMA writable_schema=OFF;")?;
        state.writable_schema = false;
    }
    let _ = conn.execute_batch("PRAGMA writable_schema=OFF; RELEASE dump;");
    if state.errors > 0 {
        writeln!(session.out, "ROLLBACK; -- due to errors")?;
    } else {
        writeln!(session.out, "COMMIT;")?;
    }
    Ok(())
}

/// Run a catalog query yielding (name, type, sql) rows and dump each object.
/// A corruption error triggers the single `ORDER BY rowid DESC` retry.
fn schema_dump_query(
    conn: &Connection,
    session: &mut Session,
    state: &mut DumpState,
    sql: &str,
    pattern: Option<&str>,
) {
    match catalog_pass(conn, session, state, sql, pattern) {
        Ok(()) => {}
        Err(e) if is_corrupt(&e) => {
            let _ = writeln!(session.out, "/****** CORRUPTION ERROR *******/");
            let _ = writeln!(session.out, "/****** {e} ******/");
            let retry = format!("{sql} ORDER BY rowid DESC");
            if let Err(e2) = catalog_pass(conn, session, state, &retry, pattern) {
                let _ = writeln!(session.out, "/****** ERROR: {e2} ******/");
                state.errors += 1;
            }
        }
        Err(_) => {
            state.errors += 1;
        }
    }
}

fn catalog_pass(
    conn: &Connection,
    session: &mut Session,
    state: &mut DumpState,
    sql: &str,
    pattern: Option<&str>,
) -> Result<()> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = match pattern {
        Some(p) => stmt.query([p])?,
        None => stmt.query([])?,
    };
    while let Some(row) = rows.next()? {
        let name: String = row.get(0)?;
        let kind: String = row.get(1)?;
        let create_sql: Option<String> = row.get(2)?;
        dump_entry(
            conn,
            session,
            state,
            &name,
            &kind,
            create_sql.as_deref().unwrap_or(""),
        )?;
    }
    Ok(())
}

/// Emit the DDL for one catalog object, then its content when it is an
/// ordinary table.
fn dump_entry(
    conn: &Connection,
    session: &mut Session,
    state: &mut DumpState,
    name: &str,
    kind: &str,
    create_sql: &str,
) -> Result<()> {
    let mut first_row: Option<String> = None;
    if name == "sqlite_sequence" {
        // the sequence table is created implicitly; only its rows replay
        first_row = Some("DELETE FROM sqlite_sequence;\n".to_string());
    } else if name == "sqlite_stat1" {
        writeln!(session.out, "ANALYZE sqlite_master;")?;
    } else if name.starts_with("sqlite_") {
        return Ok(());
    } else if create_sql.starts_with("CREATE VIRTUAL TABLE") {
        if !state.writable_schema {
            writeln!(session.out, "PRAGMA writable_schema=ON;")?;
            state.writable_schema = true;
        }
        writeln!(
            session.out,
            "INSERT INTO sqlite_master(type, name, tbl_name, rootpage, sql) \
             VALUES('table', '{}', '{}', 0, '{}');",
            escape_single_quotes(name),
            escape_single_quotes(name),
            escape_single_quotes(create_sql)
        )?;
        return Ok(());
    } else {
        writeln!(session.out, "{create_sql};")?;
    }

    if kind == "table" {
        let mut cols: Vec<String> = Vec::new();
        {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(name)))?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                cols.push(row.get(1)?);
            }
        }
        if cols.is_empty() {
            return Err(eyre!("no column information for table {name}"));
        }

        // Build: SELECT 'INSERT INTO "t"' || ' VALUES(' || quote("a"), quote("b") || ')' FROM "t"
        // The result columns, printed comma-separated, reassemble into one
        // INSERT statement per row with every value already SQL-quoted.
        let quoted_table = quote_ident(name);
        let mut select = format!(
            "SELECT {} || ' VALUES(' || ",
            sql_quote(&format!("INSERT INTO {quoted_table}"))
        );
        for (i, col) in cols.iter().enumerate() {
            select.push_str("quote(");
            select.push_str(&quote_ident(col));
            if i + 1 < cols.len() {
                select.push_str("), ");
            } else {
                select.push_str(") ");
            }
        }
        select.push_str("|| ')' FROM ");
        select.push_str(&quoted_table);

        match table_dump_query(conn, session, state, &select, &[], first_row.as_deref()) {
            Ok(()) => {}
            Err(e) if is_corrupt(&e) => {
                select.push_str(" ORDER BY rowid DESC");
                let _ = table_dump_query(conn, session, state, &select, &[], None);
            }
            Err(_) => {}
        }
    }
    Ok(())
}

/// Run a query whose rows are fragments of SQL output; print each row's
/// columns comma-joined and terminate it with `;`. If the row's leading text
/// contains `--`, the semicolon goes on its own line so a trailing comment
/// cannot swallow it. Errors are reported inline in the script as comments.
fn table_dump_query(
    conn: &Connection,
    session: &mut Session,
    state: &mut DumpState,
    select: &str,
    params: &[&dyn ToSql],
    first_row: Option<&str>,
) -> Result<()> {
    let mut report = |session: &mut Session, state: &mut DumpState, e: &rusqlite::Error| {
        let _ = writeln!(session.out, "/**** ERROR: ({}) {} *****/", error_code(e), e);
        state.errors += 1;
    };
    let mut stmt = match conn.prepare(select) {
        Ok(stmt) => stmt,
        Err(e) => {
            report(session, state, &e);
            return Err(e.into());
        }
    };
    let n = stmt.column_count();
    let mut first = first_row;
    let mut rows = match stmt.query(params) {
        Ok(rows) => rows,
        Err(e) => {
            report(session, state, &e);
            return Err(e.into());
        }
    };
    loop {
        match rows.next() {
            Ok(Some(row)) => {
                if let Some(pre) = first.take() {
                    write!(session.out, "{pre}")?;
                }
                let cells = cells_from_row(row, n)?;
                let lead = cells[0].display("").into_owned();
                write!(session.out, "{lead}")?;
                for cell in &cells[1..] {
                    write!(session.out, ",{}", cell.display(""))?;
                }
                if lead.contains("--") {
                    writeln!(session.out, "\n;")?;
                } else {
                    writeln!(session.out, ";")?;
                }
            }
            Ok(None) => return Ok(()),
            Err(e) => {
                report(session, state, &e);
                return Err(e.into());
            }
        }
    }
}

fn error_code(e: &rusqlite::Error) -> i32 {
    match e {
        rusqlite::Error::SqliteFailure(f, _) => f.extended_code,
        _ => 1,
    }
}

fn is_corrupt(e: &eyre::Report) -> bool {
    e.downcast_ref::<rusqlite::Error>()
        .map_or(false, |e| {
            e.sqlite_error_code() == Some(ErrorCode::DatabaseCorrupt)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::OutputSink;
    use std::path::Path;
    use tempfile::tempdir;

    fn file_session(path: &Path) -> Session {
        let mut session = Session::new();
        session.out = OutputSink::open(path.to_str().unwrap()).unwrap();
        session
    }

    fn fixture() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people(id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, photo BLOB);
             INSERT INTO people(name, photo) VALUES('O''Brien', x'deadbeef');
             INSERT INTO people(name, photo) VALUES(NULL, NULL);
             CREATE INDEX people_name ON people(name);
             CREATE VIEW grownups AS SELECT name FROM people;
             CREATE TABLE plain(a, b);
             INSERT INTO plain VALUES(1, 2.5);",
        )
        .unwrap();
        conn
    }

    fn dump_to_string(conn: &Connection, patterns: &[String]) -> String {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.sql");
        let mut session = file_session(&path);
        dump_database(conn, &mut session, patterns).unwrap();
        session.replace_sink(OutputSink::Stdout);
        std::fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn dump_is_transactionally_guarded() {
        let conn = fixture();
        let script = dump_to_string(&conn, &[]);
        assert!(script.starts_with("PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n"));
        assert!(script.trim_end().ends_with("COMMIT;"));
    }

    #[test]
    fn dump_quotes_values_and_blobs() {
        let conn = fixture();
        let script = dump_to_string(&conn, &[]);
        assert!(script.contains("INSERT INTO \"people\" VALUES(1,'O''Brien',X'deadbeef');"));
        assert!(script.contains("INSERT INTO \"people\" VALUES(2,NULL,NULL);"));
    }

    #[test]
    fn dump_emits_sequence_delete_before_its_rows() {
        let conn = fixture();
        let script = dump_to_string(&conn, &[]);
        let delete = script.find("DELETE FROM sqlite_sequence;").unwrap();
        let insert = script.find("INSERT INTO \"sqlite_sequence\"").unwrap();
        assert!(delete < insert);
        // the implicit catalog table itself is never recreated
        assert!(!script.contains("CREATE TABLE sqlite_sequence"));
    }

    #[test]
    fn dump_includes_indexes_and_views() {
        let conn = fixture();
        let script = dump_to_string(&conn, &[]);
        assert!(script.contains("CREATE INDEX people_name ON people(name);"));
        assert!(script.contains("CREATE VIEW grownups AS SELECT name FROM people;"));
    }

    #[test]
    fn dump_round_trips_into_equivalent_database() {
        let conn = fixture();
        let script = dump_to_string(&conn, &[]);

        let restored = Connection::open_in_memory().unwrap();
        restored.execute_batch(&script).unwrap();
        let names: i64 = restored
            .query_row("SELECT count(*) FROM people", [], |r| r.get(0))
            .unwrap();
        assert_eq!(names, 2);
        let name: String = restored
            .query_row("SELECT name FROM people WHERE id=1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(name, "O'Brien");
    }

    #[test]
    fn dump_with_pattern_selects_matching_tables_only() {
        let conn = fixture();
        let script = dump_to_string(&conn, &["plain".to_string()]);
        assert!(script.contains("CREATE TABLE plain"));
        assert!(script.contains("INSERT INTO \"plain\" VALUES(1,2.5);"));
        assert!(!script.contains("CREATE TABLE people"));
    }

    #[test]
    fn quoted_table_names_survive() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE \"odd name\"(v); INSERT INTO \"odd name\" VALUES('x');",
        )
        .unwrap();
        let script = dump_to_string(&conn, &[]);
        assert!(script.contains("INSERT INTO \"odd name\" VALUES('x');"));

        let restored = Connection::open_in_memory().unwrap();
        restored.execute_batch(&script).unwrap();
        let v: String = restored
            .query_row("SELECT v FROM \"odd name\"", [], |r| r.get(0))
            .unwrap();
        assert_eq!(v, "x");
    }
}
