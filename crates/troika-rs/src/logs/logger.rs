//! Logger configuration and structured output formatting.
//!
//! Output format:
//!
//! ```text
//! Aug 01 26 02:30:45 PM | [INFO ] | server/mod.rs:61   | listening on 127.0.0.1:8080
//! Aug 01 26 02:30:45 PM | [WARN ] | bridge.rs:219      | handler panicked while serving GET /u/42
//! ```
//!
//! Colors are applied per level and disabled when `NO_COLOR` is set.
//! Level filtering follows `RUST_LOG` with an `Info` default.

use chrono::Local;
use env_logger::Builder;
use std::env;
use std::io::Write;

/// Visible width of the `[LEVEL]` column including padding.
const LEVEL_FIELD_WIDTH: usize = 8;

/// Visible width of the `file:line` column including padding.
const FILE_LINE_FIELD_WIDTH: usize = 22;

/// Visible length of a string, ignoring simple ANSI sequences (`\x1b[...m`).
fn visible_len(s: &str) -> usize {
    let mut visible = 0;
    let mut in_escape = false;
    for ch in s.chars() {
        if in_escape {
            if ch == 'm' {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            visible += 1;
        }
    }
    visible
}

/// Configures and initializes the process logger.
///
/// Safe to call more than once: a second initialization (embedders may
/// already own a logger) is silently ignored.
pub fn configure_logger() {
    let no_color = env::var("NO_COLOR").is_ok();

    let mut builder = Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format(move |buf, record| {
        let level = record.level();
        let level_plain = level.to_string();

        let (prefix, colored_level, suffix) = if no_color {
            (String::new(), level_plain, String::new())
        } else {
            // Bold the whole line; color only the level, resetting just
            // the foreground (39) so the bold carries through.
            let colored = match level {
                log::Level::Error => format!("\x1b[31m{}\x1b[39m", level_plain),
                log::Level::Warn => format!("\x1b[33m{}\x1b[39m", level_plain),
                log::Level::Info => format!("\x1b[32m{}\x1b[39m", level_plain),
                log::Level::Debug => format!("\x1b[34m{}\x1b[39m", level_plain),
                log::Level::Trace => format!("\x1b[35m{}\x1b[39m", level_plain),
            };
            ("\x1b[1m".to_string(), colored, "\x1b[0m".to_string())
        };

        let level_display = format!("[{}]", colored_level);
        let level_padding = LEVEL_FIELD_WIDTH.saturating_sub(visible_len(&level_display)).max(1);

        let file_line = format!(
            "{}:{}",
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0)
        );
        let file_line_padding = FILE_LINE_FIELD_WIDTH
            .saturating_sub(visible_len(&file_line))
            .max(1);

        writeln!(
            buf,
            "{}{} | {}{}| {}{}| {}{}",
            prefix,
            Local::now().format("%b %d %y %I:%M:%S %p"),
            level_display,
            " ".repeat(level_padding),
            file_line,
            " ".repeat(file_line_padding),
            record.args(),
            suffix,
        )
    });
    // Ignore the error when a logger is already installed.
    let _ = builder.try_init();
}
