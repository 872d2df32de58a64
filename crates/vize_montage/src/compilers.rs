//! Compiler collaborators.
//!
//! The pipeline does not parse or compile anything itself. It orchestrates
//! the compilers behind these traits, which hosts implement on top of a real
//! SFC toolchain (or, in tests, on top of call-counting stubs).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use vize_carton::FxHashMap;

use crate::descriptor::{BindingMetadata, ScriptFragment, SourceDocument};
use crate::diagnostic::FragmentLocation;
use crate::directive::DirectiveTransforms;
use crate::error::MontageResult;
use crate::scope_id::ScopeId;

/// Splits an SFC into fragments and compiles its script blocks.
pub trait SfcCompiler: Send + Sync {
    /// Parse `source`; `filename` is project-relative.
    fn parse(&self, source: &str, filename: &Path) -> MontageResult<SourceDocument>;

    /// Merge `<script>` and `<script setup>` into one script fragment,
    /// harvesting binding metadata for the template compiler.
    fn compile_script(&self, document: &SourceDocument, id: &ScopeId)
        -> MontageResult<ScriptFragment>;
}

/// Input of [`TemplateCompiler::compile`].
#[derive(Debug, Clone)]
pub struct TemplateCompileRequest {
    /// Scope attribute, `data-v-<id>`
    pub id: String,
    /// Template source after preprocessing
    pub source: String,
    pub filename: PathBuf,
    pub scoped: bool,
    pub slotted: bool,
    pub ssr: bool,
    pub ssr_css_vars: Vec<String>,
    pub is_prod: bool,
    pub directive_transforms: Arc<DirectiveTransforms>,
    pub binding_metadata: Option<BindingMetadata>,
}

/// A template compiler error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub message: String,
    /// Fragment-local position; `None` for plain string errors
    pub loc: Option<FragmentLocation>,
}

impl TemplateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loc: None,
        }
    }

    pub fn at(message: impl Into<String>, loc: FragmentLocation) -> Self {
        Self {
            message: message.into(),
            loc: Some(loc),
        }
    }
}

/// Output of [`TemplateCompiler::compile`].
#[derive(Debug, Clone, Default)]
pub struct TemplateCompileOutput {
    /// Render function module
    pub code: String,
    pub errors: Vec<TemplateError>,
    /// Informational notices
    pub tips: Vec<String>,
}

/// Compiles template source into a render function module.
pub trait TemplateCompiler: Send + Sync {
    fn compile(&self, request: &TemplateCompileRequest) -> TemplateCompileOutput;
}

/// Resolves a preprocessor `@import` url to a file, or passes.
pub type StyleImporter = Arc<dyn Fn(&str) -> Option<PathBuf> + Send + Sync>;

/// Input of [`StyleCompiler::compile`].
#[derive(Clone)]
pub struct StyleCompileRequest {
    /// Physical path of the component
    pub filename: PathBuf,
    /// Scope attribute, `data-v-<id>`
    pub id: String,
    pub source: String,
    pub scoped: bool,
    /// Preprocessor language (scss, less, ...)
    pub preprocess_lang: Option<String>,
    pub postcss_options: Option<serde_json::Value>,
    pub postcss_plugins: Vec<serde_json::Value>,
    /// Directories searched by the preprocessor
    pub include_paths: Vec<PathBuf>,
    /// Tried in order for every unresolved import
    pub importers: Vec<StyleImporter>,
}

impl std::fmt::Debug for StyleCompileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleCompileRequest")
            .field("filename", &self.filename)
            .field("id", &self.id)
            .field("scoped", &self.scoped)
            .field("preprocess_lang", &self.preprocess_lang)
            .field("include_paths", &self.include_paths)
            .field("importers", &self.importers.len())
            .finish_non_exhaustive()
    }
}

impl StyleCompileRequest {
    /// Run the importers in order.
    pub fn resolve_import(&self, url: &str) -> Option<PathBuf> {
        self.importers.iter().find_map(|importer| importer(url))
    }
}

/// A style compiler error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleError {
    pub message: String,
    /// File the error originated in, possibly with a `?query`; `None` when
    /// the compiler did not say
    pub file: Option<String>,
    /// Line within `file` (1-based)
    pub line: u32,
    pub column: u32,
}

/// Output of [`StyleCompiler::compile`].
#[derive(Debug, Clone, Default)]
pub struct StyleCompileOutput {
    pub code: String,
    pub errors: Vec<StyleError>,
    /// Files pulled in through imports
    pub dependencies: Vec<PathBuf>,
}

/// Compiles (and optionally preprocesses and scopes) style source.
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    async fn compile(&self, request: StyleCompileRequest) -> StyleCompileOutput;
}

/// Output of [`MarkupTransformer::transform`].
#[derive(Debug, Clone, Default)]
pub struct TransformedScript {
    pub code: String,
    pub map: Option<serde_json::Value>,
}

/// Turns embedded markup (JSX/TSX) into plain script.
#[async_trait]
pub trait MarkupTransformer: Send + Sync {
    /// `None` when the transform produced no code.
    async fn transform(&self, code: &str, filename: &Path) -> Option<TransformedScript>;
}

/// Expands a shorthand template language (pug) into HTML.
pub trait TemplatePreprocessor: Send + Sync {
    fn render(&self, source: &str, filename: &Path) -> MontageResult<String>;
}

/// Optional template languages and what they are needed for.
pub(crate) const OPTIONAL_TEMPLATE_LANGS: &[(&str, &str)] = &[("pug", "Pug template rendering")];

/// The full set of collaborators the pipeline drives.
#[derive(Clone)]
pub struct Compilers {
    pub sfc: Arc<dyn SfcCompiler>,
    pub template: Arc<dyn TemplateCompiler>,
    pub style: Arc<dyn StyleCompiler>,
    pub markup: Arc<dyn MarkupTransformer>,
    /// Template language to preprocessor
    pub template_preprocessors: FxHashMap<String, Arc<dyn TemplatePreprocessor>>,
}

impl Compilers {
    pub fn new(
        sfc: Arc<dyn SfcCompiler>,
        template: Arc<dyn TemplateCompiler>,
        style: Arc<dyn StyleCompiler>,
        markup: Arc<dyn MarkupTransformer>,
    ) -> Self {
        Self {
            sfc,
            template,
            style,
            markup,
            template_preprocessors: FxHashMap::default(),
        }
    }

    /// Register a preprocessor for a template `lang`.
    pub fn with_template_preprocessor(
        mut self,
        lang: impl Into<String>,
        preprocessor: Arc<dyn TemplatePreprocessor>,
    ) -> Self {
        self.template_preprocessors.insert(lang.into(), preprocessor);
        self
    }

    pub fn template_preprocessor(&self, lang: &str) -> Option<&Arc<dyn TemplatePreprocessor>> {
        self.template_preprocessors.get(lang)
    }
}

impl std::fmt::Debug for Compilers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut langs: Vec<&str> = self
            .template_preprocessors
            .keys()
            .map(String::as_str)
            .collect();
        langs.sort_unstable();
        f.debug_struct("Compilers")
            .field("template_preprocessors", &langs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importers_run_in_order() {
        let request = StyleCompileRequest {
            filename: PathBuf::from("/p/App.vue"),
            id: "data-v-00000000".into(),
            source: String::new(),
            scoped: false,
            preprocess_lang: Some("scss".into()),
            postcss_options: None,
            postcss_plugins: Vec::new(),
            include_paths: vec![PathBuf::from("/p")],
            importers: vec![
                Arc::new(|url: &str| (url == "a").then(|| PathBuf::from("/first/a"))) as StyleImporter,
                Arc::new(|url: &str| Some(PathBuf::from(format!("/second/{}", url)))),
            ],
        };

        assert_eq!(request.resolve_import("a"), Some(PathBuf::from("/first/a")));
        assert_eq!(request.resolve_import("b"), Some(PathBuf::from("/second/b")));
        assert!(format!("{:?}", request).contains("importers: 2"));
    }

    #[test]
    fn test_template_error_constructors() {
        assert!(TemplateError::new("x").loc.is_none());
        assert_eq!(
            TemplateError::at("x", FragmentLocation::new(2, 3)).loc.map(|l| l.line),
            Some(2)
        );
    }
}
