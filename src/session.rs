//! # Session State
//!
//! One [`Session`] exists per shell run. It carries everything that the
//! administrative commands mutate and that the renderer and execution
//! pipeline consume: the output mode, column widths, separators, flags,
//! prompts, and the output sink.
//!
//! Rendering state is split into [`RenderOpts`] so that catalog commands
//! (`.schema`, `.tables`, `.databases`, `.indices`) can run their fixed
//! introspection queries through a cloned snapshot with overridden mode and
//! widths while writing to the caller's real sink, leaving the session
//! untouched.
//!
//! ## Output sinks
//!
//! Results go to an [`OutputSink`]: standard output, standard error, a file,
//! a spawned pipe (`.output |command`), or a discard sink (`.output off`).
//! Swapping the sink always closes the previous one; closing a pipe drops
//! its stdin and waits for the child so partial output is flushed before the
//! next command runs. The `.log` and `.trace` destinations use the simpler
//! [`OutputTarget`], which understands `stdout`, `stderr`, and `off`.
//!
//! ## Interrupt flag
//!
//! The only process-wide state is the interrupt flag, an atomic boolean set
//! from the Ctrl-C handler and polled cooperatively between input lines.

use std::fs::File;
use std::io::{self, Write};
use std::mem;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::{bail, Result, WrapErr};

/// Fixed capacity of the column-width tables. Columns beyond this render with
/// the default width.
pub const MAX_COLUMNS: usize = 100;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Record that an interrupt was received. Called from the signal handler.
pub fn raise_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Consume the interrupt flag, returning whether it was set.
pub fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

/// The nine output encodings selected by `.mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// One `name = value` pair per line, blank line between records
    Line,
    /// Fixed-width left-justified columns with a header rule
    Column,
    /// Values joined by the separator string
    List,
    /// Like list, but each record ends with `;`
    Semi,
    /// `<TR>`/`<TD>` table markup
    Html,
    /// `INSERT INTO <table> VALUES(...)` per record
    Insert,
    /// C/TCL-style quoted elements
    Tcl,
    /// Comma-separated values with doubled-quote escaping
    Csv,
    /// Column layout that never truncates a value
    Explain,
}

impl OutputMode {
    pub fn name(self) -> &'static str {
        match self {
            OutputMode::Line => "line",
            OutputMode::Column => "column",
            OutputMode::List => "list",
            OutputMode::Semi => "semi",
            OutputMode::Html => "html",
            OutputMode::Insert => "insert",
            OutputMode::Tcl => "tcl",
            OutputMode::Csv => "csv",
            OutputMode::Explain => "explain",
        }
    }
}

/// The slice of session state the renderer reads: everything needed to format
/// one result set. Cloneable so catalog commands can render through a
/// temporary snapshot.
#[derive(Clone)]
pub struct RenderOpts {
    pub mode: OutputMode,
    pub show_header: bool,
    /// Separator for list/semi/tcl/csv modes and `.import`
    pub separator: String,
    /// Text printed in place of NULL
    pub null_value: String,
    /// Destination table name, meaningful only in insert mode
    pub dest_table: String,
    /// Requested width per column; 0 means auto, negative means right-justify
    pub col_width: [i32; MAX_COLUMNS],
    /// Width actually used per column, frozen on the first row
    pub actual_width: [i32; MAX_COLUMNS],
    /// Records rendered so far in the current result set; the header is
    /// emitted exactly when this is zero
    pub row_count: usize,
}

impl RenderOpts {
    pub fn new() -> Self {
        RenderOpts {
            mode: OutputMode::List,
            show_header: false,
            separator: "|".to_string(),
            null_value: String::new(),
            dest_table: "table".to_string(),
            col_width: [0; MAX_COLUMNS],
            actual_width: [0; MAX_COLUMNS],
            row_count: 0,
        }
    }

    /// Configured width for column `i`, or 0 (auto) past the table's capacity.
    pub fn configured_width(&self, i: usize) -> i32 {
        if i < MAX_COLUMNS {
            self.col_width[i]
        } else {
            0
        }
    }
}

/// Rendering settings saved by `.explain`, restored by `.explain off`.
#[derive(Clone)]
pub struct ExplainPrev {
    pub mode: OutputMode,
    pub show_header: bool,
    pub col_width: [i32; MAX_COLUMNS],
}

/// Where query results are written.
pub enum OutputSink {
    Stdout,
    Stderr,
    /// Discard all output
    Off,
    File {
        path: String,
        file: File,
    },
    Pipe {
        /// The `|command` string as given, for `.show`
        command: String,
        child: Child,
        stdin: ChildStdin,
    },
}

impl OutputSink {
    /// Open a sink by name: `stdout`, `stderr`, `off`, or a filename.
    pub fn open(name: &str) -> Result<OutputSink> {
        match name {
            "stdout" => Ok(OutputSink::Stdout),
            "stderr" => Ok(OutputSink::Stderr),
            "off" => Ok(OutputSink::Off),
            path => {
                let file =
                    File::create(path).wrap_err_with(|| format!("cannot open \"{path}\""))?;
                Ok(OutputSink::File {
                    path: path.to_string(),
                    file,
                })
            }
        }
    }

    /// Spawn `sh -c command` and write output into its stdin.
    pub fn open_pipe(command: &str) -> Result<OutputSink> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .spawn()
            .wrap_err_with(|| format!("cannot open pipe \"{command}\""))?;
        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            bail!("cannot open pipe \"{command}\"");
        };
        Ok(OutputSink::Pipe {
            command: format!("|{command}"),
            child,
            stdin,
        })
    }

    /// Name shown by `.show`.
    pub fn description(&self) -> &str {
        match self {
            OutputSink::Stdout => "stdout",
            OutputSink::Stderr => "stderr",
            OutputSink::Off => "off",
            OutputSink::File { path, .. } => path,
            OutputSink::Pipe { command, .. } => command,
        }
    }

    /// Close the sink. For a pipe this drops stdin and reaps the child; for
    /// the standard streams it is a no-op.
    pub fn close(self) {
        match self {
            OutputSink::File { mut file, .. } => {
                let _ = file.flush();
            }
            OutputSink::Pipe {
                stdin, mut child, ..
            } => {
                drop(stdin);
                let _ = child.wait();
            }
            _ => {}
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout => io::stdout().write(buf),
            OutputSink::Stderr => io::stderr().write(buf),
            OutputSink::Off => Ok(buf.len()),
            OutputSink::File { file, .. } => file.write(buf),
            OutputSink::Pipe { stdin, .. } => stdin.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout => io::stdout().flush(),
            OutputSink::Stderr => io::stderr().flush(),
            OutputSink::Off => Ok(()),
            OutputSink::File { file, .. } => file.flush(),
            OutputSink::Pipe { stdin, .. } => stdin.flush(),
        }
    }
}

/// Destination for `.log` and `.trace` text.
pub enum OutputTarget {
    Stdout,
    Stderr,
    File(File),
}

impl OutputTarget {
    /// Open a target by name. `off` yields `None`.
    pub fn open(name: &str) -> Result<Option<OutputTarget>> {
        match name {
            "off" => Ok(None),
            "stdout" => Ok(Some(OutputTarget::Stdout)),
            "stderr" => Ok(Some(OutputTarget::Stderr)),
            path => {
                let file =
                    File::create(path).wrap_err_with(|| format!("cannot open \"{path}\""))?;
                Ok(Some(OutputTarget::File(file)))
            }
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputTarget::Stdout => io::stdout().write(buf),
            OutputTarget::Stderr => io::stderr().write(buf),
            OutputTarget::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputTarget::Stdout => io::stdout().flush(),
            OutputTarget::Stderr => io::stderr().flush(),
            OutputTarget::File(file) => file.flush(),
        }
    }
}

/// All mutable shell state outside the engine connection.
pub struct Session {
    pub render: RenderOpts,
    pub out: OutputSink,
    /// Echo each statement before executing it
    pub echo: bool,
    /// Print statement status counters after each statement
    pub show_stats: bool,
    /// Print wall-clock time after each buffer
    pub timer: bool,
    /// Stop non-interactive processing after the first error
    pub bail_on_error: bool,
    pub main_prompt: String,
    pub continue_prompt: String,
    /// Rendering settings saved by `.explain`, present while explain mode is
    /// active
    pub explain_prev: Option<ExplainPrev>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            render: RenderOpts::new(),
            out: OutputSink::Stdout,
            echo: false,
            show_stats: false,
            timer: false,
            bail_on_error: false,
            main_prompt: "litesh> ".to_string(),
            continue_prompt: "   ...> ".to_string(),
            explain_prev: None,
        }
    }

    /// Install a new output sink, closing the previous one.
    pub fn replace_sink(&mut self, sink: OutputSink) {
        let old = mem::replace(&mut self.out, sink);
        old.close();
    }

    /// Set the insert-mode destination table, quoting the name if it is not a
    /// plain identifier. Quote characters inside the name are doubled.
    pub fn set_insert_table(&mut self, name: &str) {
        let plain = name
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false)
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if plain {
            self.render.dest_table = name.to_string();
        } else {
            let mut quoted = String::with_capacity(name.len() + 2);
            quoted.push('\'');
            for c in name.chars() {
                quoted.push(c);
                if c == '\'' {
                    quoted.push('\'');
                }
            }
            quoted.push('\'');
            self.render.dest_table = quoted;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let old = mem::replace(&mut self.out, OutputSink::Stdout);
        old.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_startup_state() {
        let s = Session::new();
        assert_eq!(s.render.mode, OutputMode::List);
        assert_eq!(s.render.separator, "|");
        assert_eq!(s.render.null_value, "");
        assert!(!s.render.show_header);
        assert!(!s.echo);
        assert!(!s.bail_on_error);
    }

    #[test]
    fn plain_table_name_is_not_quoted() {
        let mut s = Session::new();
        s.set_insert_table("users");
        assert_eq!(s.render.dest_table, "users");
        s.set_insert_table("_tmp3");
        assert_eq!(s.render.dest_table, "_tmp3");
    }

    #[test]
    fn odd_table_name_is_quoted_with_doubled_quotes() {
        let mut s = Session::new();
        s.set_insert_table("my table");
        assert_eq!(s.render.dest_table, "'my table'");
        s.set_insert_table("it's");
        assert_eq!(s.render.dest_table, "'it''s'");
        s.set_insert_table("3rd");
        assert_eq!(s.render.dest_table, "'3rd'");
    }

    #[test]
    fn configured_width_defaults_to_auto_past_capacity() {
        let mut opts = RenderOpts::new();
        opts.col_width[0] = -7;
        assert_eq!(opts.configured_width(0), -7);
        assert_eq!(opts.configured_width(1), 0);
        assert_eq!(opts.configured_width(MAX_COLUMNS + 5), 0);
    }

    #[test]
    fn sink_descriptions() {
        assert_eq!(OutputSink::Stdout.description(), "stdout");
        assert_eq!(OutputSink::Off.description(), "off");
    }

    #[test]
    fn off_sink_discards() {
        let mut sink = OutputSink::Off;
        assert_eq!(sink.write(b"abc").unwrap(), 3);
    }

    #[test]
    fn interrupt_flag_round_trip() {
        assert!(!take_interrupt());
        raise_interrupt();
        assert!(take_interrupt());
        assert!(!take_interrupt());
    }

    #[test]
    fn log_target_off_is_none() {
        assert!(OutputTarget::open("off").unwrap().is_none());
    }
}
