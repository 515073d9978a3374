//! # Input Text Scanners
//!
//! Quote- and comment-aware helpers that the input assembler uses to decide,
//! line by line, whether accumulated text is ready to execute:
//!
//! - [`is_all_whitespace`]: is a buffer nothing but whitespace and comments?
//! - [`contains_semicolon`]: cheap pre-filter before the full completeness check
//! - [`is_command_terminator`]: recognizes the `/` and `go` terminator lines
//!   borrowed from other SQL tools
//! - [`is_complete`]: the statement-completeness oracle
//!
//! ## The completeness oracle
//!
//! The engine binding does not expose SQLite's `sqlite3_complete()`, so this
//! module carries a port of its token automaton. The scanner reduces the input
//! to a token stream (semicolon, whitespace, identifier keywords, everything
//! else) while skipping string literals, quoted identifiers, and comments, and
//! runs it through an 8-state transition table. The only grammar the table
//! knows about is the one that matters for termination: `CREATE [TEMP]
//! TRIGGER ... END;` bodies contain semicolons that must not end the
//! statement, and a leading `EXPLAIN` defers to whatever follows it.
//!
//! A semicolon inside `'...'`, `"..."`, `` `...` ``, `[...]`, or a comment is
//! never a terminator. Unterminated literals and block comments leave the
//! statement incomplete.

const TK_SEMI: usize = 0;
const TK_WS: usize = 1;
const TK_OTHER: usize = 2;
const TK_EXPLAIN: usize = 3;
const TK_CREATE: usize = 4;
const TK_TEMP: usize = 5;
const TK_TRIGGER: usize = 6;
const TK_END: usize = 7;

/// States: 0 invalid (nothing seen), 1 complete, 2 inside a statement,
/// 3 after EXPLAIN, 4 after CREATE, 5 inside a trigger body, 6 trigger body
/// after ";", 7 trigger body after "; END".
const TRANS: [[u8; 8]; 8] = [
    /*           SEMI WS OTHER EXPLAIN CREATE TEMP TRIGGER END */
    /* 0 */ [1, 0, 2, 3, 4, 2, 2, 2],
    /* 1 */ [1, 1, 2, 3, 4, 2, 2, 2],
    /* 2 */ [1, 2, 2, 2, 2, 2, 2, 2],
    /* 3 */ [1, 3, 3, 2, 4, 2, 2, 2],
    /* 4 */ [1, 4, 2, 2, 2, 4, 5, 2],
    /* 5 */ [6, 5, 5, 5, 5, 5, 5, 5],
    /* 6 */ [6, 6, 5, 5, 5, 5, 5, 7],
    /* 7 */ [1, 7, 5, 5, 5, 5, 5, 5],
];

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_id_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// True if `sql` forms one or more complete SQL statements, i.e. ends with a
/// semicolon token outside of any literal, comment, or trigger body.
pub fn is_complete(sql: &str) -> bool {
    let b = sql.as_bytes();
    let mut state = 0usize;
    let mut i = 0usize;
    while i < b.len() {
        let token;
        match b[i] {
            b';' => {
                token = TK_SEMI;
                i += 1;
            }
            c if is_space(c) => {
                token = TK_WS;
                i += 1;
            }
            b'/' => {
                if i + 1 < b.len() && b[i + 1] == b'*' {
                    i += 2;
                    while i < b.len() && !(b[i] == b'*' && i + 1 < b.len() && b[i + 1] == b'/') {
                        i += 1;
                    }
                    if i >= b.len() {
                        return false;
                    }
                    i += 2;
                    token = TK_WS;
                } else {
                    token = TK_OTHER;
                    i += 1;
                }
            }
            b'-' => {
                if i + 1 < b.len() && b[i + 1] == b'-' {
                    while i < b.len() && b[i] != b'\n' {
                        i += 1;
                    }
                    if i >= b.len() {
                        return state == 1;
                    }
                    token = TK_WS;
                    i += 1;
                } else {
                    token = TK_OTHER;
                    i += 1;
                }
            }
            b'[' => {
                i += 1;
                while i < b.len() && b[i] != b']' {
                    i += 1;
                }
                if i >= b.len() {
                    return false;
                }
                i += 1;
                token = TK_OTHER;
            }
            q @ (b'\'' | b'"' | b'`') => {
                i += 1;
                while i < b.len() && b[i] != q {
                    i += 1;
                }
                if i >= b.len() {
                    return false;
                }
                i += 1;
                token = TK_OTHER;
            }
            c if is_id_char(c) => {
                let start = i;
                while i < b.len() && is_id_char(b[i]) {
                    i += 1;
                }
                token = keyword_token(&b[start..i]);
            }
            _ => {
                token = TK_OTHER;
                i += 1;
            }
        }
        state = TRANS[state][token] as usize;
    }
    state == 1
}

fn keyword_token(word: &[u8]) -> usize {
    let eq = |kw: &str| word.eq_ignore_ascii_case(kw.as_bytes());
    if eq("create") {
        TK_CREATE
    } else if eq("temp") || eq("temporary") {
        TK_TEMP
    } else if eq("trigger") {
        TK_TRIGGER
    } else if eq("end") {
        TK_END
    } else if eq("explain") {
        TK_EXPLAIN
    } else {
        TK_OTHER
    }
}

/// Completeness check for a buffer that has just been terminated by a `/` or
/// `go` line instead of a semicolon: a terminator is appended before asking
/// the oracle.
pub fn is_complete_with_terminator(buffer: &str) -> bool {
    if buffer.is_empty() {
        return true;
    }
    let mut probe = String::with_capacity(buffer.len() + 1);
    probe.push_str(buffer);
    probe.push(';');
    is_complete(&probe)
}

/// True if `text` contains nothing but whitespace, `/* ... */` block
/// comments, and `-- ...` line comments. An unterminated block comment makes
/// the text non-whitespace (more input is required to close it).
pub fn is_all_whitespace(text: &str) -> bool {
    let b = text.as_bytes();
    let mut i = 0usize;
    while i < b.len() {
        if is_space(b[i]) {
            i += 1;
            continue;
        }
        if b[i] == b'/' && i + 1 < b.len() && b[i + 1] == b'*' {
            i += 2;
            while i < b.len() && !(b[i] == b'*' && i + 1 < b.len() && b[i + 1] == b'/') {
                i += 1;
            }
            if i >= b.len() {
                return false;
            }
            i += 2;
            continue;
        }
        if b[i] == b'-' && i + 1 < b.len() && b[i + 1] == b'-' {
            while i < b.len() && b[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        return false;
    }
    true
}

/// True if `line`, after leading whitespace, is an alternate statement
/// terminator: Oracle's `/` or SQL Server's `go` (case-insensitive), followed
/// only by whitespace or comments.
pub fn is_command_terminator(line: &str) -> bool {
    let trimmed = line.trim_start();
    let b = trimmed.as_bytes();
    if b.first() == Some(&b'/') && is_all_whitespace(&trimmed[1..]) {
        return true;
    }
    if b.len() >= 2
        && b[0].eq_ignore_ascii_case(&b'g')
        && b[1].eq_ignore_ascii_case(&b'o')
        && is_all_whitespace(&trimmed[2..])
    {
        return true;
    }
    false
}

/// True if a semicolon appears anywhere in `text`. Quote-awareness is the
/// oracle's job; this is only the cheap trigger for running it.
pub fn contains_semicolon(text: &str) -> bool {
    text.bytes().any(|b| b == b';')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_semicolon_is_complete() {
        assert!(is_complete(";"));
        assert!(is_complete("SELECT 1;"));
        assert!(is_complete("SELECT 1;\n  "));
    }

    #[test]
    fn missing_semicolon_is_incomplete() {
        assert!(!is_complete(""));
        assert!(!is_complete("SELECT 1"));
        assert!(!is_complete("   \n\t"));
    }

    #[test]
    fn semicolon_inside_string_literal_does_not_complete() {
        assert!(!is_complete("SELECT 'a;b'"));
        assert!(!is_complete("INSERT INTO t VALUES('x;y')"));
        assert!(is_complete("SELECT 'a;b';"));
    }

    #[test]
    fn unterminated_literal_is_incomplete() {
        assert!(!is_complete("SELECT 'abc;"));
        assert!(!is_complete("SELECT \"col;"));
        assert!(!is_complete("SELECT [col;"));
    }

    #[test]
    fn semicolon_inside_comment_does_not_complete() {
        assert!(!is_complete("SELECT 1 /* ; */"));
        assert!(!is_complete("SELECT 1 -- done;"));
        assert!(is_complete("SELECT 1; -- done"));
    }

    #[test]
    fn trigger_body_needs_end() {
        let partial = "CREATE TRIGGER tr AFTER INSERT ON t BEGIN SELECT 1;";
        assert!(!is_complete(partial));
        let full = "CREATE TRIGGER tr AFTER INSERT ON t BEGIN SELECT 1; END;";
        assert!(is_complete(full));
        let temp = "CREATE TEMP TRIGGER tr AFTER INSERT ON t BEGIN DELETE FROM u; END;";
        assert!(is_complete(temp));
    }

    #[test]
    fn end_inside_trigger_body_is_not_a_terminator() {
        // "end" as column name does not close the trigger
        let sql = "CREATE TRIGGER tr AFTER INSERT ON t BEGIN SELECT end FROM u; END;";
        assert!(is_complete(sql));
    }

    #[test]
    fn explain_prefix_is_transparent() {
        assert!(is_complete("EXPLAIN SELECT 1;"));
        assert!(!is_complete("EXPLAIN SELECT 1"));
    }

    #[test]
    fn multiple_statements_are_complete() {
        assert!(is_complete("SELECT 1; SELECT 2;"));
        assert!(!is_complete("SELECT 1; SELECT 2"));
    }

    #[test]
    fn terminator_probe_appends_semicolon() {
        assert!(is_complete_with_terminator("SELECT 1"));
        assert!(!is_complete_with_terminator("SELECT 'a"));
        assert!(is_complete_with_terminator(""));
    }

    #[test]
    fn whitespace_and_comments_are_whitespace() {
        assert!(is_all_whitespace(""));
        assert!(is_all_whitespace("   \t\n"));
        assert!(is_all_whitespace("/* comment */  "));
        assert!(is_all_whitespace("-- to end of line"));
        assert!(is_all_whitespace("/* a */ -- b\n  "));
    }

    #[test]
    fn unterminated_block_comment_is_not_whitespace() {
        assert!(!is_all_whitespace("/* open"));
    }

    #[test]
    fn text_is_not_whitespace() {
        assert!(!is_all_whitespace("SELECT"));
        assert!(!is_all_whitespace("  x  "));
    }

    #[test]
    fn command_terminators() {
        assert!(is_command_terminator("/"));
        assert!(is_command_terminator("  / "));
        assert!(is_command_terminator("go"));
        assert!(is_command_terminator("GO  -- send it"));
        assert!(!is_command_terminator("/x"));
        assert!(!is_command_terminator("gone"));
        assert!(!is_command_terminator("select"));
    }

    #[test]
    fn semicolon_scan_is_unconditional() {
        assert!(contains_semicolon("'a;b'"));
        assert!(!contains_semicolon("select 1"));
    }
}
