//! # Result Renderer
//!
//! Formats result rows in one of nine textual encodings selected by `.mode`.
//! The renderer is a row-at-a-time function over a [`RenderOpts`] snapshot
//! and an output sink; per-result-set state (the record counter and the
//! frozen column widths) lives in the snapshot and is reset by the execution
//! pipeline before each statement.
//!
//! | Mode    | Row layout                                | Escaping            |
//! |---------|-------------------------------------------|---------------------|
//! | line    | `name = value` pairs, blank line between  | none                |
//! | column  | fixed-width columns, 2-space gutter       | none                |
//! | list    | values joined by the separator            | none                |
//! | semi    | list, records terminated by `;`           | none                |
//! | html    | `<TR>`/`<TD>` markup                      | HTML entities       |
//! | insert  | `INSERT INTO t VALUES(...)`               | SQL quoting         |
//! | tcl     | C/TCL quoted elements                     | backslash escapes   |
//! | csv     | separator-joined, quoted when needed      | doubled quotes      |
//! | explain | column, but values are never truncated    | none                |
//!
//! ## Column widths
//!
//! In column and explain modes the width of column *i* is the configured
//! `.width` entry if one was given (negative flips justification to the
//! right); otherwise it defaults to the widest of 10, the header name, and
//! the first row's value, and stays frozen for the rest of the result set.
//! Explain mode widens individual cells past the frozen width instead of
//! truncating them.
//!
//! Headers are emitted exactly once, alongside the first data row; a result
//! set that produces no rows produces no output.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::session::{OutputMode, RenderOpts, MAX_COLUMNS};

/// One column of a result row, carrying the engine's value type so insert
/// mode can pick the right literal form.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    /// Plain-text form of the value, with NULL replaced by `null_value`.
    pub fn display<'a>(&'a self, null_value: &'a str) -> Cow<'a, str> {
        match self {
            Cell::Null => Cow::Borrowed(null_value),
            Cell::Integer(i) => Cow::Owned(i.to_string()),
            Cell::Real(r) => Cow::Owned(real_text(*r)),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Blob(b) => String::from_utf8_lossy(b),
        }
    }
}

/// Text form of a REAL value. Integral values keep a trailing `.0` so the
/// text round-trips as a real, matching the engine's own text conversion.
pub fn real_text(r: f64) -> String {
    let s = r.to_string();
    if s.contains(['.', 'e', 'E']) || r.is_nan() || r.is_infinite() {
        s
    } else {
        format!("{s}.0")
    }
}

/// SQL string literal: `O'Brien` becomes `'O''Brien'`.
pub fn sql_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        out.push(c);
        if c == '\'' {
            out.push('\'');
        }
    }
    out.push('\'');
    out
}

/// Single-quote doubling without the outer quotes, for splicing a value into
/// an already-quoted SQL fragment.
pub fn escape_single_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        out.push(c);
        if c == '\'' {
            out.push('\'');
        }
    }
    out
}

/// Double-quoted identifier with internal quotes doubled.
pub fn quote_ident(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        out.push(c);
        if c == '"' {
            out.push('"');
        }
    }
    out.push('"');
    out
}

/// Hex blob literal, e.g. `X'53514c'`.
pub fn hex_blob(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 3);
    out.push_str("X'");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out.push('\'');
    out
}

/// Entity-escape the characters that are special to HTML.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '&' => out.push_str("&amp;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// C/TCL-style quoted token: `\t \n \r \" \\` escaped, other non-printable
/// bytes as three-digit octal escapes.
pub fn c_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for b in s.bytes() {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'"' => out.push_str("\\\""),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out.push('"');
    out
}

/// A CSV field must be quoted if it contains a control byte, space, a quote
/// character, a high-bit byte, or the active separator.
fn csv_needs_quote(b: u8) -> bool {
    b <= 0x20 || b == b'"' || b == b'\'' || b >= 0x7f
}

fn write_csv_field<W: Write>(
    out: &mut W,
    opts: &RenderOpts,
    value: Option<&str>,
    trailing_sep: bool,
) -> io::Result<()> {
    match value {
        None => write!(out, "{}", opts.null_value)?,
        Some(z) => {
            let quote = z.bytes().any(csv_needs_quote)
                || (!opts.separator.is_empty() && z.contains(&opts.separator));
            if quote {
                out.write_all(b"\"")?;
                for b in z.bytes() {
                    if b == b'"' {
                        out.write_all(b"\"")?;
                    }
                    out.write_all(&[b])?;
                }
                out.write_all(b"\"")?;
            } else {
                write!(out, "{z}")?;
            }
        }
    }
    if trailing_sep {
        write!(out, "{}", opts.separator)?;
    }
    Ok(())
}

/// Rule used under column-mode headers; padded or truncated to the column
/// width.
const DASHES: &str = "---------------------------------------------------------------\
------------------------------";

/// Write `s` padded to the magnitude of `w` and truncated to the same;
/// negative `w` right-justifies.
fn write_padded<W: Write>(out: &mut W, s: &str, w: i32) -> io::Result<()> {
    if w < 0 {
        let width = (-w) as usize;
        write!(out, "{:>width$.width$}", s)
    } else {
        let width = w as usize;
        write!(out, "{:<width$.width$}", s)
    }
}

/// Render one result row in the current mode. `cols` carries the column
/// display names; `cells` the typed values.
pub fn render_row<W: Write>(
    opts: &mut RenderOpts,
    out: &mut W,
    cols: &[String],
    cells: &[Cell],
) -> io::Result<()> {
    match opts.mode {
        OutputMode::Line => {
            let mut w = 5usize;
            for name in cols {
                w = w.max(name.chars().count());
            }
            if opts.row_count > 0 {
                writeln!(out)?;
            }
            opts.row_count += 1;
            for (i, name) in cols.iter().enumerate() {
                let value = cells
                    .get(i)
                    .map(|c| c.display(&opts.null_value))
                    .unwrap_or(Cow::Borrowed(""));
                writeln!(out, "{name:>w$} = {value}")?;
            }
        }
        OutputMode::Column | OutputMode::Explain => {
            let first = opts.row_count == 0;
            opts.row_count += 1;
            if first {
                for (i, name) in cols.iter().enumerate() {
                    let mut w = opts.configured_width(i);
                    if w == 0 {
                        w = (name.chars().count() as i32).max(10);
                        let n = cells
                            .get(i)
                            .map(|c| c.display(&opts.null_value).chars().count())
                            .unwrap_or(0) as i32;
                        if w < n {
                            w = n;
                        }
                    }
                    if i < MAX_COLUMNS {
                        opts.actual_width[i] = w;
                    }
                    if opts.show_header {
                        write_padded(out, name, w)?;
                        write!(out, "{}", if i == cols.len() - 1 { "\n" } else { "  " })?;
                    }
                }
                if opts.show_header {
                    for i in 0..cols.len() {
                        let w = if i < MAX_COLUMNS {
                            opts.actual_width[i].abs()
                        } else {
                            10
                        };
                        write_padded(out, DASHES, w)?;
                        write!(out, "{}", if i == cols.len() - 1 { "\n" } else { "  " })?;
                    }
                }
            }
            for (i, cell) in cells.iter().enumerate() {
                let mut w = if i < MAX_COLUMNS {
                    opts.actual_width[i]
                } else {
                    10
                };
                let value = cell.display(&opts.null_value);
                if opts.mode == OutputMode::Explain {
                    let n = value.chars().count() as i32;
                    if n > w {
                        w = n;
                    }
                }
                write_padded(out, &value, w)?;
                write!(out, "{}", if i == cells.len() - 1 { "\n" } else { "  " })?;
            }
        }
        OutputMode::List | OutputMode::Semi => {
            let first = opts.row_count == 0;
            opts.row_count += 1;
            if first && opts.show_header {
                for (i, name) in cols.iter().enumerate() {
                    let sep = if i == cols.len() - 1 {
                        "\n"
                    } else {
                        &opts.separator
                    };
                    write!(out, "{name}{sep}")?;
                }
            }
            for (i, cell) in cells.iter().enumerate() {
                write!(out, "{}", cell.display(&opts.null_value))?;
                if i < cells.len() - 1 {
                    write!(out, "{}", opts.separator)?;
                } else if opts.mode == OutputMode::Semi {
                    writeln!(out, ";")?;
                } else {
                    writeln!(out)?;
                }
            }
        }
        OutputMode::Html => {
            let first = opts.row_count == 0;
            opts.row_count += 1;
            if first && opts.show_header {
                write!(out, "<TR>")?;
                for name in cols {
                    writeln!(out, "<TH>{}</TH>", html_escape(name))?;
                }
                writeln!(out, "</TR>")?;
            }
            write!(out, "<TR>")?;
            for cell in cells {
                writeln!(
                    out,
                    "<TD>{}</TD>",
                    html_escape(&cell.display(&opts.null_value))
                )?;
            }
            writeln!(out, "</TR>")?;
        }
        OutputMode::Tcl => {
            let first = opts.row_count == 0;
            opts.row_count += 1;
            if first && opts.show_header {
                for (i, name) in cols.iter().enumerate() {
                    write!(out, "{}", c_quote(name))?;
                    if i < cols.len() - 1 {
                        write!(out, "{}", opts.separator)?;
                    }
                }
                writeln!(out)?;
            }
            for (i, cell) in cells.iter().enumerate() {
                write!(out, "{}", c_quote(&cell.display(&opts.null_value)))?;
                if i < cells.len() - 1 {
                    write!(out, "{}", opts.separator)?;
                }
            }
            writeln!(out)?;
        }
        OutputMode::Csv => {
            let first = opts.row_count == 0;
            opts.row_count += 1;
            if first && opts.show_header {
                for (i, name) in cols.iter().enumerate() {
                    write_csv_field(out, opts, Some(name), i < cols.len() - 1)?;
                }
                writeln!(out)?;
            }
            for (i, cell) in cells.iter().enumerate() {
                let text;
                let value = match cell {
                    Cell::Null => None,
                    other => {
                        text = other.display(&opts.null_value).into_owned();
                        Some(text.as_str())
                    }
                };
                write_csv_field(out, opts, value, i < cells.len() - 1)?;
            }
            writeln!(out)?;
        }
        OutputMode::Insert => {
            opts.row_count += 1;
            write!(out, "INSERT INTO {} VALUES(", opts.dest_table)?;
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    write!(out, ",")?;
                }
                match cell {
                    Cell::Null => write!(out, "NULL")?,
                    Cell::Integer(v) => write!(out, "{v}")?,
                    Cell::Real(r) => write!(out, "{}", real_text(*r))?,
                    Cell::Text(s) => write!(out, "{}", sql_quote(s))?,
                    Cell::Blob(b) => write!(out, "{}", hex_blob(b))?,
                }
            }
            writeln!(out, ");")?;
        }
    }
    Ok(())
}
