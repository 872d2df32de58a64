//! Host integration.
//!
//! The host bundler owns the event loop. [`MontagePlugin::setup`] only
//! adjusts the host's build options and registers async handlers through the
//! [`HookRegistry`] the host implements.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use vize_carton::FxHashMap;

use crate::alias::{self, AliasResolver};
use crate::compilers::Compilers;
use crate::diagnostic::Message;
use crate::error::{MontageError, MontageResult};
use crate::fs::{FileSystem, NativeFs};
use crate::options::{MontageOptions, PathAliases, ScopeIdOption};
use crate::report::{output_dir, resolve_html_options, BuildEndReporter, BuildResult, HtmlGenerator};
use crate::router::{LoadOutcome, ModuleRouter, ResolveArgs, RouterConfig};
use crate::scope_id::{RandomBytes, ScopeIdGenerator, ScopeIdStrategy};
use crate::virtual_path::{Namespace, VirtualModuleRequest};

/// Runs when a build starts; returns warnings to report.
pub type StartHook = Box<dyn Fn() -> BoxFuture<'static, Vec<Message>> + Send + Sync>;

/// Resolves a specifier; `Ok(None)` defers to the next handler.
pub type ResolveHook = Box<
    dyn Fn(ResolveArgs) -> BoxFuture<'static, MontageResult<Option<VirtualModuleRequest>>>
        + Send
        + Sync,
>;

/// Loads a resolved module; `Ok(None)` defers to the next handler.
pub type LoadHook = Box<dyn Fn(VirtualModuleRequest) -> BoxFuture<'static, LoadOutcome> + Send + Sync>;

/// Runs when a build ends.
pub type EndHook = Box<dyn Fn(Arc<BuildResult>) -> BoxFuture<'static, MontageResult<()>> + Send + Sync>;

/// Registration surface provided by the host bundler.
///
/// Handlers are tried in registration order; `filter` is matched against the
/// path of the request.
pub trait HookRegistry {
    fn on_start(&mut self, hook: StartHook);
    fn on_resolve(&mut self, filter: Regex, hook: ResolveHook);
    fn on_load(&mut self, filter: Regex, namespace: Namespace, hook: LoadHook);
    fn on_end(&mut self, hook: EndHook);
}

/// The host's build options, as seen (and adjusted) by the plugin.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Compile-time constant replacements
    pub define: FxHashMap<String, String>,
    /// Produce a module manifest
    pub metafile: bool,
    pub sourcemap: bool,
    pub minify: bool,
    pub outdir: Option<PathBuf>,
    pub outfile: Option<PathBuf>,
    /// tsconfig location, relative to `working_dir`
    pub tsconfig: Option<PathBuf>,
    /// Build root
    pub working_dir: PathBuf,
    /// Value of `NODE_ENV` in the build environment
    pub node_env: Option<String>,
}

impl BuildOptions {
    /// Options for a build rooted at `working_dir`, reading `NODE_ENV`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            node_env: std::env::var("NODE_ENV").ok(),
            ..Default::default()
        }
    }

    pub fn is_production_env(&self) -> bool {
        self.node_env.as_deref() == Some("production")
    }
}

/// The SFC bundler plugin.
pub struct MontagePlugin {
    options: MontageOptions,
    compilers: Compilers,
    fs: Arc<dyn FileSystem>,
    html_generator: Option<Arc<dyn HtmlGenerator>>,
}

impl MontagePlugin {
    /// Plugin name reported to the host.
    pub const NAME: &'static str = "vue";

    pub fn new(options: MontageOptions, compilers: Compilers) -> Self {
        Self {
            options,
            compilers,
            fs: Arc::new(NativeFs),
            html_generator: None,
        }
    }

    /// Use a different filesystem.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Generator used when `generateHTML` is set.
    pub fn with_html_generator(mut self, generator: Arc<dyn HtmlGenerator>) -> Self {
        self.html_generator = Some(generator);
        self
    }

    /// Adjust `build` and register every handler on `hooks`.
    ///
    /// Returns the router so the host's watch layer can invalidate paths.
    pub async fn setup(
        self,
        build: &mut BuildOptions,
        hooks: &mut dyn HookRegistry,
    ) -> MontageResult<Arc<ModuleRouter>> {
        let Self {
            mut options,
            compilers,
            fs,
            html_generator,
        } = self;

        inject_defines(&options, build);

        if options.generate_html.is_some() && !build.metafile {
            build.metafile = true;
        }

        if options.disable_resolving == Some(true) {
            tracing::warn!("disableResolving is deprecated, use pathAliases instead");
            options.path_aliases = PathAliases::Enabled(false);
            hooks.on_start(Box::new(|| {
                async {
                    vec![Message::text(
                        "The disableResolving option is deprecated, use pathAliases instead",
                    )]
                }
                .boxed()
            }));
        }

        let tsconfig = build
            .tsconfig
            .clone()
            .unwrap_or_else(|| PathBuf::from("tsconfig.json"));
        let rules = alias::load_rules(
            &options.path_aliases,
            &tsconfig,
            &build.working_dir,
            fs.as_ref(),
        )
        .await;
        tracing::debug!("{} path alias rules", rules.len());
        let aliases = Arc::new(AliasResolver::new(rules, options.alias_policy));

        let strategy = match &options.scope_id {
            ScopeIdOption::Mode(_) => ScopeIdStrategy::Hash,
            ScopeIdOption::Random { random: Some(seed) } => {
                ScopeIdStrategy::Random(RandomBytes::seeded(seed))
            }
            ScopeIdOption::Random { random: None } => {
                ScopeIdStrategy::Random(RandomBytes::from_entropy()?)
            }
        };
        let scope_ids = Arc::new(ScopeIdGenerator::new(
            strategy,
            options.scope_id_collision_bound,
        ));

        let config = RouterConfig {
            cwd: build.working_dir.clone(),
            render_ssr: options.render_ssr,
            is_prod: options.is_prod || build.minify || build.is_production_env(),
            sourcemap: build.sourcemap,
            disable_cache: options.disable_cache,
            postcss: options.postcss.clone(),
            directive_transforms: Arc::new(options.directive_transforms.clone()),
        };
        let router = Arc::new(ModuleRouter::new(
            config,
            compilers,
            Arc::clone(&fs),
            Arc::clone(&aliases),
            scope_ids,
        ));

        if !aliases.is_empty() {
            let r = Arc::clone(&router);
            hooks.on_resolve(
                filter(".*")?,
                Box::new(move |args: ResolveArgs| {
                    let router = Arc::clone(&r);
                    async move {
                        Ok(router
                            .resolve_alias(&args.path)
                            .map(VirtualModuleRequest::file))
                    }
                    .boxed()
                }),
            );
        }

        let r = Arc::clone(&router);
        hooks.on_resolve(
            filter(r"\.vue")?,
            Box::new(move |args: ResolveArgs| {
                let router = Arc::clone(&r);
                async move { router.resolve_component(&args).map(Some) }.boxed()
            }),
        );

        let r = Arc::clone(&router);
        hooks.on_load(
            filter(r"\.[tj]sx$")?,
            Namespace::File,
            Box::new(move |request: VirtualModuleRequest| {
                let router = Arc::clone(&r);
                async move { router.load_markup_file(&request.path).await }.boxed()
            }),
        );

        let r = Arc::clone(&router);
        hooks.on_load(
            filter(r"\.vue$")?,
            Namespace::File,
            Box::new(move |request: VirtualModuleRequest| {
                let router = Arc::clone(&r);
                async move { router.load_component(&request.path).await }.boxed()
            }),
        );

        for namespace in [Namespace::Script, Namespace::Template, Namespace::Style] {
            let r = Arc::clone(&router);
            hooks.on_load(
                filter(".*")?,
                namespace,
                Box::new(move |request: VirtualModuleRequest| {
                    let router = Arc::clone(&r);
                    async move { router.load(&request).await }.boxed()
                }),
            );
        }

        if let Some(generate_html) = options.generate_html.clone() {
            let out_dir = output_dir(build.outdir.as_deref(), build.outfile.as_deref());
            let reporter = Arc::new(BuildEndReporter::new(
                resolve_html_options(generate_html.into_options(), out_dir.as_deref()),
                build.minify,
                html_generator,
            ));
            hooks.on_end(Box::new(move |result: Arc<BuildResult>| {
                let reporter = Arc::clone(&reporter);
                async move { reporter.on_end(&result).await.map(|_| ()) }.boxed()
            }));
        }

        Ok(router)
    }
}

/// Add the compile-time flags the runtime expects.
fn inject_defines(options: &MontageOptions, build: &mut BuildOptions) {
    let node_env = if build.is_production_env() || options.is_prod {
        "'production'"
    } else {
        "'development'"
    };

    build.define.insert(
        "__VUE_OPTIONS_API__".to_string(),
        (!options.disable_options_api).to_string(),
    );
    build.define.insert(
        "__VUE_PROD_DEVTOOLS__".to_string(),
        options.enable_dev_tools.to_string(),
    );
    build
        .define
        .insert("process.env.NODE_ENV".to_string(), node_env.to_string());
}

fn filter(pattern: &str) -> MontageResult<Regex> {
    Regex::new(pattern).map_err(|e| MontageError::Config(format!("invalid filter {pattern}: {e}")))
}
