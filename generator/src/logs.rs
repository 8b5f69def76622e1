//! Progress output for a batch run.
//!
//! Messages go to stdout with a level marker and optional nesting, so a
//! group's parts line up under their UMDM.

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
}

impl LogLevel {
    fn marker(&self) -> &'static str {
        match self {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
        }
    }
}

/// Render one progress line.
pub fn format_line(level: LogLevel, indent: u8, message: &str) -> String {
    format!("{}{} {}", "   ".repeat(indent as usize), level.marker(), message)
}

fn log(level: LogLevel, indent: u8, message: impl Into<String>) {
    println!("{}", format_line(level, indent, &message.into()));
}

pub fn log_info(msg: impl Into<String>) {
    log(LogLevel::Info, 0, msg);
}

pub fn log_success(msg: impl Into<String>) {
    log(LogLevel::Success, 0, msg);
}

pub fn log_warning(msg: impl Into<String>) {
    log(LogLevel::Warning, 0, msg);
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    log(LogLevel::Info, indent, msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        assert_eq!(format_line(LogLevel::Info, 0, "FILE GROUP 1"), "    FILE GROUP 1");
        assert_eq!(format_line(LogLevel::Success, 0, "done"), "   ✓ done");
    }

    #[test]
    fn test_nested_parts_line_up() {
        let line = format_line(LogLevel::Info, 1, "Part 1: UMAM = umd_2");
        assert!(line.starts_with("       Part 1"));
    }
}
