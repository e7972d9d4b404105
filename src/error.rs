//! Structured error types for the export pipeline.
//!
//! Every stage either succeeds completely or aborts the whole export with one
//! of these variants. There is no partial output and no internal retry.

use thiserror::Error;

/// The unified error type returned by all public snapdoc API functions.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The live element tree could not be read while building the snapshot.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// The captured region has zero area after scaling.
    #[error("Empty snapshot: region is {width}x{height} after scaling")]
    EmptySnapshot { width: u32, height: u32 },

    /// The image encoder could not compress the raster surface.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A caller-supplied value is out of range (page width, quality, image bytes).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Loading or drawing the snapshot container failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Region or options JSON failed to parse.
    #[error("Failed to parse {what}: {source}{}", format_hint(.hint))]
    Config {
        what: &'static str,
        source: serde_json::Error,
        hint: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

/// Generates factory methods for [`ExportError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl ExportError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a snapshot error.
    snapshot => Snapshot,
    /// Create an encode error.
    encode => Encode,
    /// Create an invalid input error.
    invalid_input => InvalidInput,
    /// Create a render error.
    render => Render,
}

impl ExportError {
    /// Wrap a JSON error with a hint about what most likely went wrong.
    pub fn config(what: &'static str, source: serde_json::Error) -> Self {
        let hint = match source.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ExportError::Config { what, source, hint }
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_pick_the_right_variant() {
        assert!(matches!(ExportError::snapshot("x"), ExportError::Snapshot(_)));
        assert!(matches!(ExportError::encode("x"), ExportError::Encode(_)));
        assert!(matches!(
            ExportError::invalid_input("x"),
            ExportError::InvalidInput(_)
        ));
        assert!(matches!(ExportError::render("x"), ExportError::Render(_)));
    }

    #[test]
    fn test_empty_snapshot_message() {
        let e = ExportError::EmptySnapshot {
            width: 0,
            height: 12,
        };
        assert_eq!(e.to_string(), "Empty snapshot: region is 0x12 after scaling");
    }

    #[test]
    fn test_config_error_carries_hint() {
        let source = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}").unwrap_err();
        let e = ExportError::config("region", source);
        let msg = e.to_string();
        assert!(msg.starts_with("Failed to parse region:"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }
}
