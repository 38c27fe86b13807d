//! Colored terminal output for install operations

use std::io::Write;
use termcolor::{Buffer, BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    /// Renders into a fresh buffer and prints it, unless quiet.
    fn emit(&self, render: impl FnOnce(&mut Buffer)) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        render(&mut buffer);
        self.bufwtr.print(&buffer)
    }

    fn symbol_line(&self, symbol: &str, color: Color, bold: bool, message: &str, body: Option<Color>) -> std::io::Result<()> {
        self.emit(|buffer| paint(buffer, symbol, color, bold, message, body))
    }

    /// Print an info message (normal output)
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        self.symbol_line("ℹ", Color::Cyan, false, message, None)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.symbol_line("✓", Color::Green, true, message, None)
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.symbol_line("⚠", Color::Yellow, true, message, Some(Color::Yellow))
    }

    /// Print a pipeline stage as it starts
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.symbol_line("⋯", Color::Magenta, false, message, None)
    }

    /// Print a verbose/debug message (only in verbose mode)
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        self.symbol_line("→", Color::Blue, false, message, Some(Color::White))
    }

    /// Print an error message (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        paint(&mut buffer, "✗", Color::Red, true, message, Some(Color::Red));

        if bufwtr.print(&buffer).is_err() {
            // Stderr failed - fallback to stdout as last resort
            println!("[STDERR ERROR] ✗ {}", message);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.emit(|buffer| {
            let _ = writeln!(buffer);
            let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
            let _ = writeln!(buffer, "═══ {} ═══", title);
            let _ = buffer.reset();
        })
    }

    /// Print an aligned `key: value` line
    pub fn field(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.emit(|buffer| {
            let _ = buffer.set_color(ColorSpec::new().set_bold(true));
            let _ = write!(buffer, "  {:<14}", format!("{}:", key));
            let _ = buffer.reset();
            let _ = writeln!(buffer, " {}", value);
        })
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.emit(|buffer| {
            let _ = writeln!(buffer, "    {}", message);
        })
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        self.emit(|buffer| {
            let _ = writeln!(buffer, "{}", message);
        })
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

fn paint(buffer: &mut Buffer, symbol: &str, color: Color, bold: bool, message: &str, body: Option<Color>) {
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
    let _ = write!(buffer, "{}", symbol);
    let _ = buffer.reset();
    if let Some(body) = body {
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(body)));
    }
    let _ = writeln!(buffer, " {}", message);
    let _ = buffer.reset();
}
