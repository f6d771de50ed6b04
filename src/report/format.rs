//! Pure formatting collaborators for the TAP renderer.

use std::backtrace::{Backtrace, BacktraceStatus};

use serde_json::Value;

/// Frames from these origins are runtime plumbing, not test code.
const NOISE_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "tokio::",
    "futures::",
    "futures_",
    "rust_begin_unwind",
    "__rust",
    "backtrace::",
    "start_thread",
    "volley::",
];

/// Render an optional attached value for an `expected:`/`actual:` line.
/// Absent values render as the YAML null `~`.
pub fn render_value(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "~".to_string(),
    }
}

/// Reduce a captured backtrace to the frames that point at test code,
/// dropping runtime and standard-library plumbing.
///
/// Returns `None` when the backtrace was not captured (backtraces are
/// gated on `RUST_BACKTRACE`) or when no frame survives the filter.
pub fn clean_backtrace(backtrace: &Backtrace) -> Option<String> {
    if backtrace.status() != BacktraceStatus::Captured {
        return None;
    }

    let rendered = backtrace.to_string();
    let mut kept = Vec::new();
    let mut keep_location = false;
    for line in rendered.lines() {
        let trimmed = line.trim_start();
        if let Some(symbol) = frame_symbol(trimmed) {
            keep_location = !is_noise(symbol);
            if keep_location {
                kept.push(trimmed.to_string());
            }
        } else if keep_location && trimmed.starts_with("at ") {
            kept.push(trimmed.to_string());
        }
    }

    if kept.is_empty() { None } else { Some(kept.join("\n")) }
}

/// `"12: path::to::symbol"` -> `"path::to::symbol"`.
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, rest) = line.split_once(": ")?;
    if index.chars().all(|c| c.is_ascii_digit()) && !index.is_empty() {
        Some(rest)
    } else {
        None
    }
}

fn is_noise(symbol: &str) -> bool {
    NOISE_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_value_renders_as_yaml_null() {
        assert_eq!(render_value(None), "~");
    }

    #[test]
    fn values_render_as_compact_json() {
        assert_eq!(render_value(Some(&json!(3))), "3");
        assert_eq!(render_value(Some(&json!("text"))), "\"text\"");
        assert_eq!(render_value(Some(&json!({"a": [1, 2]}))), "{\"a\":[1,2]}");
    }

    #[test]
    fn frame_symbols_are_extracted() {
        assert_eq!(
            frame_symbol("3: my_crate::tests::explode"),
            Some("my_crate::tests::explode")
        );
        assert_eq!(frame_symbol("at src/lib.rs:10:5"), None);
        assert_eq!(frame_symbol("not a frame"), None);
    }

    #[test]
    fn runtime_frames_are_noise() {
        assert!(is_noise("std::panicking::begin_panic"));
        assert!(is_noise("tokio::runtime::task::core::Core<T,S>::poll"));
        assert!(!is_noise("my_crate::tests::explode"));
    }

    #[test]
    fn disabled_backtrace_cleans_to_none() {
        // Force-disabled backtraces report BacktraceStatus::Disabled.
        let backtrace = std::backtrace::Backtrace::disabled();
        assert_eq!(clean_backtrace(&backtrace), None);
    }
}
