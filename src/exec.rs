//! # Execution Pipeline
//!
//! Drives a buffer of SQL text, possibly containing several statements,
//! against the engine and feeds each result row to the renderer.
//!
//! For each statement in the text:
//!
//! 1. Prepare the next statement; a prepare failure aborts the remaining
//!    text and carries the engine's message. Whitespace and comments between
//!    statements are skipped.
//! 2. Echo the statement text when `.echo` is on.
//! 3. Step through the rows, handing each row's (name, value, type) triples
//!    to the row callback. A callback may ask to stop early; that is a clean
//!    stop, not an error.
//! 4. Print the statement's status counters when `.stats` is on. The
//!    counters must be read before finalize, while the statement is live.
//! 5. Finalize; a finalize failure becomes the statement's reported error.
//!
//! The first failing statement stops the rest of the buffer; the caller owns
//! the decision to keep going with later input (and prefixes the error with
//! a line number when input came from a file).

use std::io::Write;

use eyre::Result;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, Row, Statement, StatementStatus, ToSql};

use crate::render::{self, Cell};
use crate::session::{OutputSink, RenderOpts, Session};

/// Row callback: receives the render snapshot, the sink, column names, and
/// typed values. Returning `Ok(true)` stops stepping the current statement.
pub type RowFn<'a> =
    dyn FnMut(&mut RenderOpts, &mut OutputSink, &[String], &[Cell]) -> Result<bool> + 'a;

/// Extract the typed cells of one result row.
pub fn cells_from_row(row: &Row, n: usize) -> Result<Vec<Cell>> {
    (0..n)
        .map(|i| {
            Ok(match row.get_ref(i)? {
                ValueRef::Null => Cell::Null,
                ValueRef::Integer(v) => Cell::Integer(v),
                ValueRef::Real(v) => Cell::Real(v),
                ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
                ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
            })
        })
        .collect()
}

/// Execute every statement in `sql`, rendering rows with the session's
/// current mode.
pub fn execute(conn: &Connection, session: &mut Session, sql: &str) -> Result<()> {
    execute_with(conn, session, sql, &mut |opts, out, cols, cells| {
        render::render_row(opts, out, cols, cells)?;
        Ok(false)
    })
}

/// Execute every statement in `sql` with an explicit row callback.
pub fn execute_with(
    conn: &Connection,
    session: &mut Session,
    sql: &str,
    on_row: &mut RowFn,
) -> Result<()> {
    let mut batch = Batch::new(conn, sql);
    while let Some(mut stmt) = batch.next()? {
        session.render.row_count = 0;
        if session.echo {
            let text = stmt.expanded_sql().unwrap_or_default();
            writeln!(session.out, "{text}")?;
        }
        let n = stmt.column_count();
        let cols: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut step_err: Option<rusqlite::Error> = None;
        {
            let mut rows = stmt.raw_query();
            loop {
                match rows.next() {
                    Ok(Some(row)) => {
                        let cells = cells_from_row(row, n)?;
                        if on_row(&mut session.render, &mut session.out, &cols, &cells)? {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        step_err = Some(e);
                        break;
                    }
                }
            }
        }
        if session.show_stats {
            print_statement_stats(&stmt, &mut session.out)?;
        }
        stmt.finalize()?;
        if let Some(e) = step_err {
            return Err(e.into());
        }
    }
    Ok(())
}

/// Run a single introspection query through a caller-supplied render
/// snapshot, leaving the real session untouched.
pub fn run_query(
    conn: &Connection,
    opts: &mut RenderOpts,
    out: &mut OutputSink,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<()> {
    let mut stmt = conn.prepare(sql)?;
    let n = stmt.column_count();
    let cols: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let mut rows = stmt.query(params)?;
    while let Some(row) = rows.next()? {
        let cells = cells_from_row(row, n)?;
        render::render_row(opts, out, &cols, &cells)?;
    }
    Ok(())
}

fn print_statement_stats(stmt: &Statement, out: &mut OutputSink) -> Result<()> {
    writeln!(
        out,
        "Fullscan Steps:                      {}",
        stmt.get_status(StatementStatus::FullscanStep)
    )?;
    writeln!(
        out,
        "Sort Operations:                     {}",
        stmt.get_status(StatementStatus::Sort)
    )?;
    writeln!(
        out,
        "Autoindex Inserts:                   {}",
        stmt.get_status(StatementStatus::AutoIndex)
    )?;
    writeln!(
        out,
        "Virtual Machine Steps:               {}",
        stmt.get_status(StatementStatus::VmStep)
    )?;
    Ok(())
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

    #[test]
    fn select_renders_rows_in_list_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);

        execute(
            &conn,
            &mut session,
            "CREATE TABLE t(a, b); INSERT INTO t VALUES(1, 'x'); SELECT * FROM t;",
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1|x\n");
    }

    #[test]
    fn header_uses_column_display_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);
        session.render.show_header = true;

        execute(&conn, &mut session, "SELECT 1;").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n1\n");
    }

    #[test]
    fn statements_run_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);

        execute(&conn, &mut session, "SELECT 1; SELECT 2;").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "1\n2\n");
    }

    #[test]
    fn prepare_failure_carries_engine_message() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);

        let err = execute(&conn, &mut session, "SELECT * FROM missing;").unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn error_halts_remaining_statements() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);

        let res = execute(
            &conn,
            &mut session,
            "CREATE TABLE t(a); SELECT * FROM missing; CREATE TABLE u(a);",
        );
        assert!(res.is_err());

        // the statement after the failure must not have run
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE name='u'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn comments_and_whitespace_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);

        execute(&conn, &mut session, "-- nothing to do\n").unwrap();
        execute(&conn, &mut session, "  ;  ").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn echo_prints_statement_before_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);
        session.echo = true;

        execute(&conn, &mut session, "SELECT 7;").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SELECT 7;\n7\n");
    }

    #[test]
    fn row_callback_can_stop_early() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);
        conn.execute_batch("CREATE TABLE t(a); INSERT INTO t VALUES(1),(2),(3);")
            .unwrap();

        let mut seen = 0usize;
        execute_with(&conn, &mut session, "SELECT a FROM t;", &mut |_, _, _, _| {
            seen += 1;
            Ok(seen == 2)
        })
        .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn run_query_renders_with_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let conn = Connection::open_in_memory().unwrap();
        let mut session = file_session(&path);
        let mut opts = session.render.clone();
        opts.mode = crate::session::OutputMode::Semi;

        run_query(&conn, &mut opts, &mut session.out, "SELECT 'a'", &[]).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a;\n");
        // real session untouched
        assert_eq!(session.render.mode, crate::session::OutputMode::List);
    }
}
