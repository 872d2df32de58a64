//! Structured diagnostics and fragment-to-file location mapping.
//!
//! Compilers report positions relative to the fragment they were handed. The
//! host wants positions in the physical `.vue` file, so every diagnostic whose
//! origin is the fragment being compiled goes through [`map_location`].

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A position inside one fragment, as reported by a compiler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentLocation {
    /// Line within the fragment (1-based)
    pub line: u32,
    /// Column within the line (0-based)
    pub column: u32,
    /// Source excerpt the diagnostic points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FragmentLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line,
            column,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A position in a physical file, as handed to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// File path
    pub file: String,
    /// Line (1-based)
    pub line: u32,
    /// Column (0-based)
    pub column: u32,
    /// Text of the offending line or excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_text: Option<String>,
    /// Namespace of `file` when it is not a plain filesystem path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Error or warning message returned to the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Message {
    /// A message without a location.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: None,
        }
    }

    /// A message pointing at `location`.
    pub fn at(text: impl Into<String>, location: Location) -> Self {
        Self {
            text: text.into(),
            location: Some(location),
        }
    }
}

/// Translate a fragment-local position into a physical-file position.
///
/// `fragment_start_line` is the 0-based line on which the fragment's content
/// starts, so a 1-based fragment line maps to a 1-based file line.
pub fn map_location(
    loc: &FragmentLocation,
    fragment_start_line: u32,
    physical_path: &Path,
) -> Location {
    Location {
        file: physical_path.to_string_lossy().into_owned(),
        line: loc.line + fragment_start_line,
        column: loc.column,
        line_text: loc.source.clone(),
        namespace: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_location_adds_start_line() {
        let loc = FragmentLocation::new(3, 7).with_source("<div v-if>");
        let mapped = map_location(&loc, 12, Path::new("/src/App.vue"));

        assert_eq!(mapped.line, 15);
        assert_eq!(mapped.column, 7);
        assert_eq!(mapped.file, "/src/App.vue");
        assert_eq!(mapped.line_text.as_deref(), Some("<div v-if>"));
    }

    #[test]
    fn test_map_location_at_file_start() {
        let mapped = map_location(&FragmentLocation::new(1, 0), 0, Path::new("a.vue"));
        assert_eq!(mapped.line, 1);
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message::at(
            "bad",
            Location {
                file: "a.vue".into(),
                line: 2,
                column: 1,
                line_text: Some("x".into()),
                namespace: None,
            },
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["location"]["lineText"], "x");
        assert!(json["location"].get("namespace").is_none());
    }
}
