//! Plain-text rendering helpers

use byod_core::ProgressEvent;
use serde_json::{Map, Value};

/// Human-readable size: `512 B`, `1.5 KB`, `2.0 GB`
pub fn format_bytes(size: u64) -> String {
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64 / 1024.0;
    for unit in ["KB", "MB", "GB"] {
        if value < 1024.0 {
            return format!("{:.1} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.1} TB", value)
}

/// One progress line, e.g. `[ 40%] encrypting: Encrypting files`
pub fn progress_line(progress: &ProgressEvent) -> String {
    if progress.message.is_empty() {
        format!("[{:>3}%] {}", progress.percent, progress.stage)
    } else {
        format!(
            "[{:>3}%] {}: {}",
            progress.percent, progress.stage, progress.message
        )
    }
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// `key: value` lines for a completed operation's result object
pub fn result_lines(result: &Map<String, Value>) -> Vec<String> {
    result
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}: {}", key, s),
            other => format!("{}: {}", key, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.0 GB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024 * 1024), "3.0 TB");
    }

    #[test]
    fn test_progress_line() {
        let progress = ProgressEvent {
            stage: "encrypting".to_string(),
            percent: 40,
            message: "Encrypting files".to_string(),
        };
        assert_eq!(progress_line(&progress), "[ 40%] encrypting: Encrypting files");

        let bare = ProgressEvent {
            stage: "receiving".to_string(),
            percent: 5,
            message: String::new(),
        };
        assert_eq!(progress_line(&bare), "[  5%] receiving");
    }

    #[test]
    fn test_result_lines_unquote_strings() {
        let result = json!({"job_id": "abc123", "files": 3});
        let lines = result_lines(result.as_object().unwrap());
        assert!(lines.contains(&"job_id: abc123".to_string()));
        assert!(lines.contains(&"files: 3".to_string()));
    }
}
