//! Plugin configuration.
//!
//! [`MontageOptions`] mirrors the JSON a project writes in
//! `vize.montage.json`. Everything has a default, so an empty object (or no
//! file at all) is a valid configuration. Directive transforms carry closures
//! and are therefore configured in code only.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alias::AliasPolicy;
use crate::directive::DirectiveTransforms;

/// Configuration file name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "vize.montage.json";

/// Default acceptable probability of a scope id collision within one build.
pub const DEFAULT_COLLISION_BOUND: f64 = 1e-6;

/// Top-level plugin options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MontageOptions {
    /// How component scope ids are derived.
    pub scope_id: ScopeIdOption,

    /// Run every transform fresh instead of memoizing (watch rebuilds).
    pub disable_cache: bool,

    /// Compile templates for server-side rendering.
    #[serde(rename = "renderSSR")]
    pub render_ssr: bool,

    /// Force production template output.
    pub is_prod: bool,

    /// Define `__VUE_OPTIONS_API__` as `false`.
    pub disable_options_api: bool,

    /// Define `__VUE_PROD_DEVTOOLS__` as `true`.
    pub enable_dev_tools: bool,

    /// Where path alias rules come from.
    pub path_aliases: PathAliases,

    /// Whether alias rules stop at the first match or chain.
    pub alias_policy: AliasPolicy,

    /// Deprecated switch that turns off alias resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_resolving: Option<bool>,

    /// Generate an `index.html` from the build manifest at the end of the build.
    #[serde(rename = "generateHTML", skip_serializing_if = "Option::is_none")]
    pub generate_html: Option<GenerateHtml>,

    /// PostCSS pass-through for the style compiler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postcss: Option<PostcssOptions>,

    /// Acceptable probability of any scope id collision within one build.
    pub scope_id_collision_bound: f64,

    /// Custom directive handling for the template compiler.
    #[serde(skip)]
    pub directive_transforms: DirectiveTransforms,
}

impl Default for MontageOptions {
    fn default() -> Self {
        Self {
            scope_id: ScopeIdOption::default(),
            disable_cache: false,
            render_ssr: false,
            is_prod: false,
            disable_options_api: false,
            enable_dev_tools: false,
            path_aliases: PathAliases::default(),
            alias_policy: AliasPolicy::default(),
            disable_resolving: None,
            generate_html: None,
            postcss: None,
            scope_id_collision_bound: DEFAULT_COLLISION_BOUND,
            directive_transforms: DirectiveTransforms::default(),
        }
    }
}

/// `"hash"` or `{ "random": "<seed>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScopeIdOption {
    Mode(ScopeIdMode),
    Random {
        #[serde(default)]
        random: Option<String>,
    },
}

impl Default for ScopeIdOption {
    fn default() -> Self {
        Self::Mode(ScopeIdMode::Hash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeIdMode {
    Hash,
}

/// `true` reads `compilerOptions.paths` from tsconfig, `false` disables
/// aliasing, an object lists rules explicitly (`{"@/*": "src/*"}`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PathAliases {
    Enabled(bool),
    Rules(serde_json::Map<String, serde_json::Value>),
}

impl Default for PathAliases {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// `"src/index.html"` shorthand or the full option object.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GenerateHtml {
    SourceFile(PathBuf),
    Options(HtmlOptions),
}

impl GenerateHtml {
    /// Expand the string shorthand.
    pub fn into_options(self) -> HtmlOptions {
        match self {
            Self::SourceFile(source_file) => HtmlOptions {
                source_file: Some(source_file),
                ..HtmlOptions::default()
            },
            Self::Options(options) => options,
        }
    }
}

/// Options handed to the HTML generator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim_path: Option<PathBuf>,
    /// Generator-specific settings, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// PostCSS pass-through.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcssOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
    #[serde(default)]
    pub plugins: Vec<serde_json::Value>,
}

/// Load [`CONFIG_FILE_NAME`] from the given directory (or CWD if None).
///
/// A missing file yields defaults; an unreadable or invalid one is reported
/// and also yields defaults.
pub fn load_config(dir: Option<&Path>) -> MontageOptions {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        return MontageOptions::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                MontageOptions::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", config_path.display(), e);
            MontageOptions::default()
        }
    }
}
