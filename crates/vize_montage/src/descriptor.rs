//! Parsed single-file component types.
//!
//! A [`SourceDocument`] is produced by the [`SfcCompiler`](crate::compilers::SfcCompiler)
//! collaborator once per physical file and is immutable afterwards.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vize_carton::FxHashMap;

use crate::error::{MontageError, MontageResult};

/// Binding name to binding type, harvested from the script block.
pub type BindingMetadata = FxHashMap<String, String>;

/// Parsed representation of one physical SFC file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    /// Originating file path
    pub filename: PathBuf,

    /// Script block (options API or `<script>` without setup)
    #[serde(default)]
    pub script: Option<ScriptFragment>,

    /// Script setup block
    #[serde(default)]
    pub script_setup: Option<ScriptFragment>,

    /// Template block
    #[serde(default)]
    pub template: Option<TemplateFragment>,

    /// Style blocks in source order
    #[serde(default)]
    pub styles: Vec<StyleFragment>,

    /// Whether the component uses `:slotted`
    #[serde(default)]
    pub slotted: bool,
}

impl SourceDocument {
    /// Whether the component contributes a script export.
    pub fn has_script(&self) -> bool {
        self.script.is_some() || self.script_setup.is_some()
    }

    /// Whether any style block is scoped.
    pub fn has_scoped_style(&self) -> bool {
        self.styles.iter().any(|s| s.scoped)
    }

    /// Style fragment at `index`; errors name the physical `path`.
    pub fn style(&self, path: &Path, index: usize) -> MontageResult<&StyleFragment> {
        self.styles
            .get(index)
            .ok_or_else(|| MontageError::StyleIndexOutOfRange {
                path: path.to_path_buf(),
                index,
                len: self.styles.len(),
            })
    }
}

/// Location of a fragment inside its physical file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRange {
    /// Start offset in source
    pub start: usize,

    /// End offset in source
    pub end: usize,

    /// Line on which the fragment's content starts (0-based)
    pub start_line: u32,
}

/// Script block, or the compiled result of the script blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFragment {
    pub content: String,

    /// Declared dialect (`lang` attribute)
    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub range: FragmentRange,

    /// Whether this is `<script setup>`
    #[serde(default)]
    pub setup: bool,

    /// Inline source map produced by script compilation
    #[serde(default)]
    pub map: Option<serde_json::Value>,

    /// Binding metadata (filled after analysis)
    #[serde(default)]
    pub bindings: Option<BindingMetadata>,
}

/// Template block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFragment {
    pub content: String,

    /// Preprocessor language (default: html)
    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub range: FragmentRange,
}

/// Style block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleFragment {
    pub content: String,

    /// Preprocessor language (css/scss/less/etc)
    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default)]
    pub range: FragmentRange,

    #[serde(default)]
    pub scoped: bool,

    /// CSS module name, if any
    #[serde(default)]
    pub module: Option<String>,
}

/// Recognised script dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLang {
    Ts,
    Tsx,
    Js,
    Jsx,
}

impl ScriptLang {
    /// Parse a `lang` attribute. A script must declare one, so `None` is
    /// rejected like an unknown dialect.
    pub fn parse(lang: Option<&str>) -> Option<Self> {
        match lang? {
            "ts" => Some(Self::Ts),
            "tsx" => Some(Self::Tsx),
            "js" => Some(Self::Js),
            "jsx" => Some(Self::Jsx),
            _ => None,
        }
    }

    /// Whether the dialect embeds markup syntax.
    pub fn has_markup(self) -> bool {
        matches!(self, Self::Tsx | Self::Jsx)
    }

    /// Whether the dialect is typed.
    pub fn is_typed(self) -> bool {
        matches!(self, Self::Ts | Self::Tsx)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Tsx => "tsx",
            Self::Js => "js",
            Self::Jsx => "jsx",
        }
    }
}

impl fmt::Display for ScriptLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
