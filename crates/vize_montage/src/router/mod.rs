//! Virtual module router.
//!
//! Classifies resolution requests into namespaces and serves load requests
//! per namespace. Every load goes through the single-flight cache keyed by
//! its [`VirtualModuleRequest`]. Derived loads look their component context up
//! before touching the cache, so a request that arrives before its `file`
//! load fails without leaving an entry behind.
//!
//! ```text
//!   resolve("./App.vue?type=style&index=0")
//!        │
//!        ▼
//!   VirtualModuleRequest { /src/App.vue, sfc-style, 0 }
//!        │
//!        ▼ load
//!   ┌──────────┬──────────┬────────────┬─────────┐
//!   │   file   │  script  │  template  │  style  │
//!   │  (stub)  │          │            │         │
//!   └────┬─────┴────▲─────┴─────▲──────┴────▲────┘
//!        │          └───────────┴───────────┘
//!        └──── ComponentContext (document, scope id, script)
//! ```

mod script;
mod stub;
mod style;
mod template;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vize_carton::path::{absolutize, split_query};

use crate::alias::AliasResolver;
use crate::cache::AsyncCache;
use crate::compilers::Compilers;
use crate::context::ContextRegistry;
use crate::diagnostic::Message;
use crate::directive::DirectiveTransforms;
use crate::error::MontageResult;
use crate::fs::FileSystem;
use crate::options::PostcssOptions;
use crate::scope_id::ScopeIdGenerator;
use crate::virtual_path::{Namespace, VirtualModuleRequest};

pub use stub::synthesize_stub;
pub use template::fix_self_references;

/// How the host should interpret load contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Ts,
    Css,
}

/// Answer to a load request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<Loader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub watch_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Message>,
}

impl LoadResult {
    /// Successful output for `path`.
    pub fn module(contents: String, loader: Loader, path: &Path) -> Self {
        Self {
            contents: Some(contents),
            loader: Some(loader),
            resolve_dir: path.parent().map(Path::to_path_buf),
            ..Default::default()
        }
    }

    /// Diagnostics only; the host reports them and the module is not built.
    pub fn failed(errors: Vec<Message>) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Result of a load: fatal error, "not mine" (`None`), or output.
pub type LoadOutcome = MontageResult<Option<Arc<LoadResult>>>;

/// Arguments of a resolution request.
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Specifier as written in the import
    pub path: String,
    /// Module containing the import
    pub importer: Option<PathBuf>,
    /// Directory relative specifiers resolve against
    pub resolve_dir: Option<PathBuf>,
}

impl ResolveArgs {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_resolve_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resolve_dir = Some(dir.into());
        self
    }
}

/// Build-wide settings the router needs.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Build root; `__file` and hash scope ids are relative to it
    pub cwd: PathBuf,
    pub render_ssr: bool,
    /// Production template output
    pub is_prod: bool,
    /// Append inline source maps to compiled scripts
    pub sourcemap: bool,
    pub disable_cache: bool,
    pub postcss: Option<PostcssOptions>,
    pub directive_transforms: Arc<DirectiveTransforms>,
}

impl RouterConfig {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            render_ssr: false,
            is_prod: false,
            sourcemap: false,
            disable_cache: false,
            postcss: None,
            directive_transforms: Arc::new(DirectiveTransforms::default()),
        }
    }
}

/// The virtual module state machine.
pub struct ModuleRouter {
    config: RouterConfig,
    compilers: Compilers,
    fs: Arc<dyn FileSystem>,
    aliases: Arc<AliasResolver>,
    scope_ids: Arc<ScopeIdGenerator>,
    contexts: ContextRegistry,
    cache: AsyncCache<VirtualModuleRequest, LoadOutcome>,
}

impl ModuleRouter {
    pub fn new(
        config: RouterConfig,
        compilers: Compilers,
        fs: Arc<dyn FileSystem>,
        aliases: Arc<AliasResolver>,
        scope_ids: Arc<ScopeIdGenerator>,
    ) -> Self {
        let cache = AsyncCache::new(!config.disable_cache);
        Self {
            config,
            compilers,
            fs,
            aliases,
            scope_ids,
            contexts: ContextRegistry::new(),
            cache,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn scope_ids(&self) -> &ScopeIdGenerator {
        &self.scope_ids
    }

    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    /// Rewrite `specifier` through the alias rules and probe the filesystem.
    ///
    /// `None` defers to the host's own resolution.
    pub fn resolve_alias(&self, specifier: &str) -> Option<PathBuf> {
        if self.aliases.is_empty() {
            return None;
        }
        let resolved = self
            .aliases
            .resolve(specifier, &self.config.cwd, |p| self.fs.is_file(p))?;
        tracing::debug!("alias {} -> {}", specifier, resolved.display());
        Some(resolved)
    }

    /// Classify a component specifier into a namespace with an absolute path.
    pub fn resolve_component(&self, args: &ResolveArgs) -> MontageResult<VirtualModuleRequest> {
        let (path, query) = split_query(&args.path);
        let base = args.resolve_dir.as_deref().unwrap_or(&self.config.cwd);
        let request = VirtualModuleRequest::from_query(absolutize(Path::new(path), base), query)?;
        tracing::debug!("resolve {} -> {}", args.path, request);
        Ok(request)
    }

    /// Serve any routed request.
    pub async fn load(&self, request: &VirtualModuleRequest) -> LoadOutcome {
        match request.namespace {
            Namespace::File if is_markup_file(&request.path) => {
                self.load_markup_file(&request.path).await
            }
            Namespace::File => self.load_component(&request.path).await,
            Namespace::Script => self.load_script(&request.path).await,
            Namespace::Template => self.load_template(&request.path).await,
            Namespace::Style => self.load_style(&request.path, request.index.unwrap_or(0)).await,
        }
    }

    /// Load the stub module of a component and record its context.
    pub async fn load_component(&self, path: &Path) -> LoadOutcome {
        let key = VirtualModuleRequest::file(path);
        self.cache
            .get_or_compute(key, || self.compile_component(path))
            .await
    }

    /// Load a `.tsx`/`.jsx` file through the markup transform.
    pub async fn load_markup_file(&self, path: &Path) -> LoadOutcome {
        let key = VirtualModuleRequest::file(path);
        self.cache
            .get_or_compute(key, || self.compile_markup_file(path))
            .await
    }

    /// Load the script module of a component.
    pub async fn load_script(&self, path: &Path) -> LoadOutcome {
        let context = self.contexts.get(path)?;
        let key = VirtualModuleRequest::script(path);
        self.cache
            .get_or_compute(key, || self.compile_script_module(path, context))
            .await
    }

    /// Load the render function module of a component.
    pub async fn load_template(&self, path: &Path) -> LoadOutcome {
        let context = self.contexts.get(path)?;
        let key = VirtualModuleRequest::template(path);
        self.cache
            .get_or_compute(key, || self.compile_template_module(path, context))
            .await
    }

    /// Load style block `index` of a component.
    pub async fn load_style(&self, path: &Path, index: usize) -> LoadOutcome {
        let context = self.contexts.get(path)?;
        let key = VirtualModuleRequest::style(path, index);
        self.cache
            .get_or_compute(key, || self.compile_style_module(path, index, context))
            .await
    }

    /// Forget everything derived from `path`. Scope ids are kept.
    pub fn invalidate(&self, path: &Path) -> usize {
        let removed = self.cache.invalidate_where(|key| key.path == path);
        self.contexts.evict(path);
        tracing::debug!("invalidated {} entries for {}", removed, path.display());
        removed
    }
}

/// Whether `path` is a standalone `.tsx`/`.jsx` module.
pub(crate) fn is_markup_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx") | Some("jsx")
    )
}
