//! Helpers that render grouped status values as single lines.

use crate::image_loader::Transform;
use crate::settings::TimerPosition;
use crate::state::scheduler::format_clock;
use crate::state::{Notice, SessionState, Severity, StatusSnapshot};

/// Formats the countdown part of the status line.
///
/// Unlimited display time shows as `--:--`.
pub fn format_countdown(status: &StatusSnapshot) -> String {
    match (status.state, status.break_remaining, status.remaining_time) {
        (SessionState::OnBreak, Some(left), _) => format!("break {}", format_clock(left)),
        (SessionState::Active | SessionState::Paused, _, Some(left)) => format_clock(left),
        (SessionState::Active | SessionState::Paused, _, None) => "--:--".to_string(),
        _ => String::new(),
    }
}

/// Full status line: state, position and countdown, padded for the timer position.
pub fn status_line(status: &StatusSnapshot, position: TimerPosition, width: usize) -> String {
    let mut parts = vec![format!("{:?}", status.state)];
    if status.total > 0 {
        parts.push(format!("{}/{}", status.position, status.total));
    }
    let countdown = format_countdown(status);
    if !countdown.is_empty() {
        parts.push(countdown);
    }
    if status.settings_open {
        parts.push("(settings)".to_string());
    }
    let line = parts.join("  ");

    match position {
        TimerPosition::Left => line,
        TimerPosition::Center => format!("{:^width$}", line),
        TimerPosition::Right => format!("{:>width$}", line),
    }
}

pub fn notice_line(notice: &Notice) -> String {
    let tag = match notice.severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    format!("[{}] {}: {}", tag, notice.title, notice.message)
}

/// Short description such as `rot 90, flip h`; empty for the identity.
pub fn transform_label(transform: &Transform) -> String {
    let mut parts = Vec::new();
    if transform.rotation != 0 {
        parts.push(format!("rot {}", transform.rotation));
    }
    if transform.flip_horizontal {
        parts.push("flip h".to_string());
    }
    if transform.flip_vertical {
        parts.push("flip v".to_string());
    }
    parts.join(", ")
}
