use chrono::Local;
use nu_ansi_term::{Color, Style};
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{format::Writer, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
    Layer,
};

/// Target used for the human-readable status lines.
pub const STATUS_TARGET: &str = "task_result";

/// Installs console + hourly rolling file logging.
///
/// Console: status lines at INFO, everything else at WARN (DEBUG when `verbose`).
/// File: status lines at INFO, everything else at INFO.
pub fn setup_logger(verbose: bool) -> Option<WorkerGuard> {
    std::fs::create_dir_all("logs").ok();

    let file_appender = tracing_appender::rolling::hourly("logs", "pinger");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = tracing_subscriber::filter::Targets::new()
        .with_target(STATUS_TARGET, Level::INFO)
        .with_default(Level::INFO);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .event_format(FileFormatter)
        .with_filter(file_filter);

    let console_default = if verbose { Level::DEBUG } else { Level::WARN };
    let console_filter = tracing_subscriber::filter::Targets::new()
        .with_target(STATUS_TARGET, Level::INFO)
        .with_default(console_default);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .event_format(TerminalFormatter)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();

    // Caller must keep the guard alive or buffered file lines are lost
    Some(guard)
}

// --- Formatters ---

struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// Highlights SUCCESS/FAILED tokens; non-status targets get a level tag.
pub struct TerminalFormatter;

impl<S, N> FormatEvent<S, N> for TerminalFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);
        let msg = highlight_status(&msg_visitor.message);

        let metadata = event.metadata();
        if metadata.target() != STATUS_TARGET {
            let level = *metadata.level();
            let color = match level {
                Level::ERROR => Color::LightRed,
                Level::WARN => Color::Yellow,
                _ => Color::DarkGray,
            };
            write!(writer, "{} ", color.paint(format!("[{}]", level)))?;
        }

        write!(writer, "{}", msg)?;
        writeln!(writer)
    }
}

fn highlight_status(msg: &str) -> String {
    if msg.contains("SUCCESS") {
        let green_text = Style::new().fg(Color::LightGreen).bold();
        msg.replace("SUCCESS", &green_text.paint("SUCCESS").to_string())
    } else if msg.contains("FAILED") {
        let red_text = Style::new().fg(Color::LightRed).bold();
        msg.replace("FAILED", &red_text.paint("FAILED").to_string())
    } else {
        msg.to_string()
    }
}

pub struct FileFormatter;

impl<S, N> FormatEvent<S, N> for FileFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let level = event.metadata().level();

        write!(writer, "{} [{}] ", timestamp, level)?;

        let mut msg_visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut msg_visitor);
        writeln!(writer, "{}", strip_ansi_codes(&msg_visitor.message))
    }
}

/// Removes ANSI color sequences that callers baked into the message.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_escape = false;

    for ch in text.chars() {
        if ch == '\x1b' {
            in_escape = true;
        } else if in_escape && ch == 'm' {
            in_escape = false;
        } else if !in_escape {
            result.push(ch);
        }
    }
    result
}
