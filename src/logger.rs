//! Terminal logging with colored module prefixes.
//!
//! - `log!` macro for one-line messages: `[module] message`
//! - [`alert`] for degraded-path failures that must not stop a page
//! - [`Progress`] for a single in-place progress line during `apply`
//!
//! # Example
//!
//! ```ignore
//! log!("apply"; "rewriting {} pages", count);
//! alert(&format!("json-ld skipped for {url}: {err}"));
//!
//! let progress = Progress::new("pages", 42);
//! progress.inc();
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Set while a progress line occupies the last terminal row
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

// Progress line format: "[pages] [████░░░░] 42/100"
//                        ^-----^ ^-------^ ^----^
//                        prefix  bar       count

/// Brackets around the module name plus the space after it: "[] "
const PREFIX_OVERHEAD: usize = 3;
/// " []" around the bar plus the space before the count
const BAR_OVERHEAD: usize = 4;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Report a non-fatal failure.
///
/// Used where the page keeps rendering without the failed enhancement.
pub fn alert(message: &str) {
    log("alert", message);
}

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to the terminal width.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let max_msg_len = terminal_width().saturating_sub(module.len() + PREFIX_OVERHEAD);
    let message = if message.contains('\n') {
        message
    } else {
        truncate_str(message, max_msg_len)
    };

    let mut stdout = stdout().lock();
    let progress_active = PROGRESS_ACTIVE.load(Ordering::SeqCst);
    if progress_active {
        execute!(stdout, cursor::MoveUp(1)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();

    // Keep the row reserved for the progress line below the message
    if progress_active {
        writeln!(stdout).ok();
    }
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "apply" | "pages" => prefix.bright_green().bold(),
        "error" | "alert" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Progress Line
// ============================================================================

/// A single progress bar redrawn in place on the last terminal row.
///
/// `inc` may be called from rayon workers; redraws are serialized.
pub struct Progress {
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
}

impl Progress {
    /// Reserve a terminal row and start at `0/total`.
    pub fn new(module: &'static str, total: usize) -> Self {
        let mut stdout = stdout().lock();
        writeln!(stdout).ok();
        stdout.flush().ok();
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);

        Self {
            prefix: colorize_prefix(module),
            prefix_len: module.len() + PREFIX_OVERHEAD,
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
        }
    }

    /// Count one finished item and redraw.
    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        self.display(current);
    }

    fn display(&self, current: usize) {
        let _guard = self.lock.lock().ok();

        let count = format!("{current}/{}", self.total);
        let bar = render_bar(current, self.total, self.bar_width(count.len()));

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveUp(1)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{bar}] {count}", self.prefix).ok();
        execute!(stdout, cursor::MoveDown(1)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    fn bar_width(&self, count_len: usize) -> usize {
        let overhead = self.prefix_len + BAR_OVERHEAD + count_len;
        terminal_width()
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
    }

    /// Clear the progress line.
    pub fn finish(&self) {
        if !PROGRESS_ACTIVE.swap(false, Ordering::SeqCst) {
            return;
        }
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveUp(1)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Filled/empty cells for `current` out of `total` in `width` cells.
fn render_bar(current: usize, total: usize, width: usize) -> String {
    let filled = if total > 0 {
        (current.min(total) * width) / total
    } else {
        0
    };
    "█".repeat(filled) + &"░".repeat(width - filled)
}
