//! # Bulk Import
//!
//! `.import FILE TABLE` reads delimiter-separated records and inserts them
//! through one prepared positional-parameter statement, all inside a single
//! transaction. Any malformed record aborts the import and rolls the whole
//! transaction back, so a file either loads completely or not at all.
//!
//! Fields may be wrapped in double quotes; a quoted field can contain the
//! separator and even line breaks (the record reader keeps consuming lines
//! until the quotes balance), and doubled quotes inside it collapse to one.

use std::fs::File;
use std::io::{BufRead, BufReader};

use eyre::{bail, Result, WrapErr};
use rusqlite::{params_from_iter, Connection};

/// Import `file` into `table`, one row per record. The active separator must
/// be non-empty.
pub fn import_file(conn: &Connection, separator: &str, file: &str, table: &str) -> Result<()> {
    if separator.is_empty() {
        bail!("non-null separator required for import");
    }

    // Derive the column count from the table itself.
    let ncol = conn
        .prepare(&format!("SELECT * FROM {table}"))?
        .column_count();
    if ncol == 0 {
        return Ok(());
    }

    let placeholders = vec!["?"; ncol].join(",");
    let mut stmt = conn.prepare(&format!("INSERT INTO {table} VALUES({placeholders})"))?;

    let input = File::open(file).wrap_err_with(|| format!("cannot open \"{file}\""))?;
    let mut reader = BufReader::new(input);

    conn.execute_batch("BEGIN")?;
    let mut lineno = 0usize;
    let result = (|| -> Result<()> {
        while let Some(record) = read_record(&mut reader)? {
            lineno += 1 + record.matches('\n').count();
            let fields = split_record(&record, separator);
            if fields.len() != ncol {
                bail!(
                    "{file} line {lineno}: expected {ncol} columns of data but found {}",
                    fields.len()
                );
            }
            let values: Vec<String> = fields.iter().map(|f| dequote_field(f)).collect();
            stmt.execute(params_from_iter(values.iter()))?;
        }
        Ok(())
    })();

    match &result {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(_) => {
            let _ = conn.execute_batch("ROLLBACK");
        }
    }
    result
}

/// Read one record, spanning physical lines while a double-quoted field is
/// still open. Returns the record without its trailing line ending.
fn read_record<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut record = String::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line)?;
        if n == 0 {
            if record.is_empty() {
                return Ok(None);
            }
            return Ok(Some(record));
        }
        record.push_str(&line);
        let quotes = record.bytes().filter(|&b| b == b'"').count();
        if quotes % 2 == 0 {
            if record.ends_with('\n') {
                record.pop();
                if record.ends_with('\r') {
                    record.pop();
                }
            }
            return Ok(Some(record));
        }
    }
}

/// Split on the separator, honoring double-quoted fields.
fn split_record<'a>(record: &'a str, separator: &str) -> Vec<&'a str> {
    let mut fields = Vec::new();
    let mut in_quote = false;
    let mut start = 0usize;
    let mut i = 0usize;
    let bytes = record.as_bytes();
    while i < bytes.len() {
        if bytes[i] == b'"' {
            in_quote = !in_quote;
            i += 1;
        } else if !in_quote && record[i..].starts_with(separator) {
            fields.push(&record[start..i]);
            i += separator.len();
            start = i;
        } else {
            i += 1;
        }
    }
    fields.push(&record[start..]);
    fields
}

/// Strip the surrounding quotes from a quoted field and collapse doubled
/// quotes. Unquoted fields pass through unchanged.
fn dequote_field(field: &str) -> String {
    if !field.starts_with('"') {
        return field.to_string();
    }
    let chars: Vec<char> = field.chars().collect();
    let mut out = String::with_capacity(field.len());
    let mut j = 1usize;
    while j < chars.len() {
        if chars[j] == '"' {
            j += 1;
            if j >= chars.len() {
                break;
            }
        }
        out.push(chars[j]);
        j += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn split_honors_quoted_separators() {
        assert_eq!(split_record("a|b|c", "|"), vec!["a", "b", "c"]);
        assert_eq!(split_record("\"a|b\"|c", "|"), vec!["\"a|b\"", "c"]);
        assert_eq!(split_record("a||c", "|"), vec!["a", "", "c"]);
    }

    #[test]
    fn multi_byte_separator() {
        assert_eq!(split_record("a::b::c", "::"), vec!["a", "b", "c"]);
    }

    #[test]
    fn dequote_collapses_doubled_quotes() {
        assert_eq!(dequote_field("plain"), "plain");
        assert_eq!(dequote_field("\"quoted\""), "quoted");
        assert_eq!(dequote_field("\"say \"\"hi\"\"\""), "say \"hi\"");
    }

    #[test]
    fn record_reader_spans_quoted_newlines() {
        let data = "a|\"line1\nline2\"\nb|c\n";
        let mut reader = std::io::Cursor::new(data);
        let first = read_record(&mut reader).unwrap().unwrap();
        assert_eq!(first, "a|\"line1\nline2\"");
        let second = read_record(&mut reader).unwrap().unwrap();
        assert_eq!(second, "b|c");
        assert!(read_record(&mut reader).unwrap().is_none());
    }

    #[test]
    fn import_loads_every_row() {
        let dir = tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(a, b);").unwrap();
        let file = write_file(&dir, "rows.txt", "1|one\n2|two\n3|three\n");

        import_file(&conn, "|", &file, "t").unwrap();

        let count: i64 = conn
            .query_row("SELECT count(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);
        let b: String = conn
            .query_row("SELECT b FROM t WHERE a='2'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(b, "two");
    }

    #[test]
    fn short_record_rolls_back_the_whole_import() {
        let dir = tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(a, b);").unwrap();
        let file = write_file(&dir, "rows.txt", "1|one\nonly-one-field\n3|three\n");

        let err = import_file(&conn, "|", &file, "t").unwrap_err();
        assert!(err.to_string().contains("expected 2 columns"));
        assert!(err.to_string().contains("line 2"));

        let count: i64 = conn
            .query_row("SELECT count(*) FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0, "no rows from a failed import may be committed");
    }

    #[test]
    fn quoted_fields_keep_separator_and_newline() {
        let dir = tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(a, b);").unwrap();
        let file = write_file(&dir, "rows.txt", "1|\"a|b\nc\"\n");

        import_file(&conn, "|", &file, "t").unwrap();

        let b: String = conn
            .query_row("SELECT b FROM t", [], |r| r.get(0))
            .unwrap();
        assert_eq!(b, "a|b\nc");
    }

    #[test]
    fn empty_separator_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t(a);").unwrap();
        let err = import_file(&conn, "", "nope.txt", "t").unwrap_err();
        assert!(err.to_string().contains("separator"));
    }

    #[test]
    fn missing_table_reports_engine_error() {
        let dir = tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        let file = write_file(&dir, "rows.txt", "1\n");
        let err = import_file(&conn, "|", &file, "nope").unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }
}
