//! Shared fixtures: an in-memory host, a tag-splitting SFC parser and
//! call-counting compilers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::Notify;
use vize_montage::compilers::{
    StyleCompileOutput, StyleCompileRequest, StyleError, TemplateCompileOutput,
    TemplateCompileRequest, TemplateError, TransformedScript,
};
use vize_montage::descriptor::{FragmentRange, ScriptFragment, StyleFragment, TemplateFragment};
use vize_montage::plugin::{EndHook, LoadHook, ResolveHook, StartHook};
use vize_montage::report::BuildResult;
use vize_montage::router::LoadOutcome;
use vize_montage::{
    BuildOptions, Compilers, FileSystem, HookRegistry, MarkupTransformer, MemoryFs, Message, ModuleRouter,
    MontageOptions, MontagePlugin, MontageResult, Namespace, ResolveArgs, ScopeId, SfcCompiler,
    SourceDocument, StyleCompiler, TemplateCompiler, TemplatePreprocessor, VirtualModuleRequest,
};

pub const ROOT: &str = "/project";

// =============================================================================
// Host
// =============================================================================

/// Host that dispatches requests to registered hooks in registration order.
#[derive(Default)]
pub struct TestHost {
    start: Vec<StartHook>,
    resolve: Vec<(Regex, ResolveHook)>,
    load: Vec<(Regex, Namespace, LoadHook)>,
    end: Vec<EndHook>,
}

impl HookRegistry for TestHost {
    fn on_start(&mut self, hook: StartHook) {
        self.start.push(hook);
    }

    fn on_resolve(&mut self, filter: Regex, hook: ResolveHook) {
        self.resolve.push((filter, hook));
    }

    fn on_load(&mut self, filter: Regex, namespace: Namespace, hook: LoadHook) {
        self.load.push((filter, namespace, hook));
    }

    fn on_end(&mut self, hook: EndHook) {
        self.end.push(hook);
    }
}

impl TestHost {
    pub async fn start(&self) -> Vec<Message> {
        let mut warnings = Vec::new();
        for hook in &self.start {
            warnings.extend(hook().await);
        }
        warnings
    }

    pub async fn resolve(&self, args: ResolveArgs) -> MontageResult<Option<VirtualModuleRequest>> {
        for (filter, hook) in &self.resolve {
            if !filter.is_match(&args.path) {
                continue;
            }
            if let Some(resolved) = hook(args.clone()).await? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    pub async fn load(&self, request: &VirtualModuleRequest) -> LoadOutcome {
        let path = request.path.to_string_lossy();
        for (filter, namespace, hook) in &self.load {
            if *namespace != request.namespace || !filter.is_match(&path) {
                continue;
            }
            if let Some(result) = hook(request.clone()).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    pub async fn end(&self, result: BuildResult) -> MontageResult<()> {
        let result = Arc::new(result);
        for hook in &self.end {
            hook(Arc::clone(&result)).await?;
        }
        Ok(())
    }

    pub fn resolve_hook_count(&self) -> usize {
        self.resolve.len()
    }
}

// =============================================================================
// SFC parser
// =============================================================================

/// Splits `<script>`, `<template>` and `<style>` blocks by tag search.
#[derive(Default)]
pub struct StubSfc {
    pub parse_calls: AtomicUsize,
    pub script_calls: AtomicUsize,
}

fn attr(open_tag: &str, name: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"\b{}="([^"]*)""#, name)).ok()?;
    re.captures(open_tag).map(|c| c[1].to_string())
}

fn has_flag(open_tag: &str, name: &str) -> bool {
    open_tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .split_whitespace()
        .any(|part| part == name)
}

struct Block {
    open_tag: String,
    content: String,
    range: FragmentRange,
}

/// Find every `<tag ...>...</tag>` block; `last_close` pairs the opener with
/// the last closing tag (templates nest `<template>` for slots).
fn blocks(source: &str, tag: &str, last_close: bool) -> Vec<Block> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(pos) = source[from..].find(&open) {
        let start = from + pos;
        let Some(tag_end) = source[start..].find('>').map(|p| start + p + 1) else {
            break;
        };
        let close_at = if last_close {
            source.rfind(&close)
        } else {
            source[tag_end..].find(&close).map(|p| tag_end + p)
        };
        let Some(end) = close_at else {
            break;
        };

        out.push(Block {
            open_tag: source[start..tag_end].to_string(),
            content: source[tag_end..end].to_string(),
            range: FragmentRange {
                start: tag_end,
                end,
                start_line: source[..tag_end].matches('\n').count() as u32,
            },
        });
        from = end + close.len();
        if last_close {
            break;
        }
    }
    out
}

impl SfcCompiler for StubSfc {
    fn parse(&self, source: &str, filename: &Path) -> MontageResult<SourceDocument> {
        self.parse_calls.fetch_add(1, Ordering::SeqCst);
        let mut document = SourceDocument {
            filename: filename.to_path_buf(),
            ..Default::default()
        };

        for block in blocks(source, "script", false) {
            let fragment = ScriptFragment {
                content: block.content,
                lang: attr(&block.open_tag, "lang"),
                range: block.range,
                setup: has_flag(&block.open_tag, "setup"),
                ..Default::default()
            };
            if fragment.setup {
                document.script_setup = Some(fragment);
            } else {
                document.script = Some(fragment);
            }
        }

        document.template = blocks(source, "template", true)
            .into_iter()
            .next()
            .map(|block| TemplateFragment {
                content: block.content,
                lang: attr(&block.open_tag, "lang"),
                range: block.range,
            });

        document.styles = blocks(source, "style", false)
            .into_iter()
            .map(|block| StyleFragment {
                content: block.content,
                lang: attr(&block.open_tag, "lang"),
                range: block.range,
                scoped: has_flag(&block.open_tag, "scoped"),
                module: attr(&block.open_tag, "module"),
            })
            .collect();

        Ok(document)
    }

    fn compile_script(
        &self,
        document: &SourceDocument,
        _id: &ScopeId,
    ) -> MontageResult<ScriptFragment> {
        self.script_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = document
            .script_setup
            .clone()
            .or_else(|| document.script.clone())
            .unwrap_or_default();
        script.map = Some(serde_json::json!({ "version": 3, "mappings": "AAAA" }));
        script.bindings = Some(
            [("msg".to_string(), "setup-ref".to_string())]
                .into_iter()
                .collect(),
        );
        Ok(script)
    }
}

// =============================================================================
// Compilers
// =============================================================================

/// Template compiler that counts calls and records every request.
#[derive(Default)]
pub struct CountingTemplate {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<TemplateCompileRequest>>,
    pub errors: Mutex<Vec<TemplateError>>,
    pub tips: Mutex<Vec<String>>,
}

impl TemplateCompiler for CountingTemplate {
    fn compile(&self, request: &TemplateCompileRequest) -> TemplateCompileOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        let render = if request.ssr { "ssrRender" } else { "render" };
        TemplateCompileOutput {
            code: format!("export function {}() {{ /* {} */ }}", render, request.id),
            errors: self.errors.lock().clone(),
            tips: self.tips.lock().clone(),
        }
    }
}

/// Style compiler that yields once (so concurrent callers interleave) and
/// echoes its input.
#[derive(Default)]
pub struct CountingStyle {
    pub calls: AtomicUsize,
    pub sources: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<StyleError>>,
    pub imports: Mutex<Vec<(String, Option<PathBuf>)>>,
}

#[async_trait]
impl StyleCompiler for CountingStyle {
    async fn compile(&self, request: StyleCompileRequest) -> StyleCompileOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.sources.lock().push(request.source.clone());

        let mut dependencies = Vec::new();
        for line in request.source.lines() {
            if let Some(url) = line.trim().strip_prefix("@import ") {
                let url = url.trim_end_matches(';').trim_matches('"');
                let resolved = request.resolve_import(url);
                if let Some(path) = &resolved {
                    dependencies.push(path.clone());
                }
                self.imports.lock().push((url.to_string(), resolved));
            }
        }

        StyleCompileOutput {
            code: format!("/* {} */{}", request.id, request.source.trim()),
            errors: self.errors.lock().clone(),
            dependencies,
        }
    }
}

/// Markup transform that tags its output; fails on `FAIL`.
#[derive(Default)]
pub struct StubMarkup {
    pub calls: AtomicUsize,
}

#[async_trait]
impl MarkupTransformer for StubMarkup {
    async fn transform(&self, code: &str, _filename: &Path) -> Option<TransformedScript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if code.contains("FAIL") {
            return None;
        }
        Some(TransformedScript {
            code: format!("/* jsx */{}", code),
            map: None,
        })
    }
}

/// "Pug" preprocessor that emits boolean attributes the way pug does.
pub struct StubPug;

impl TemplatePreprocessor for StubPug {
    fn render(&self, source: &str, _filename: &Path) -> MontageResult<String> {
        Ok(source
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(' ') {
                Some((tag, attr)) if attr.contains('=') => format!("<{} {}></{}>", tag, attr, tag),
                Some((tag, attr)) => format!("<{} {}=\"{}\"></{}>", tag, attr, attr, tag),
                None => format!("<{}></{}>", line, line),
            })
            .collect())
    }
}

// =============================================================================
// Filesystem
// =============================================================================

/// Holds the next read open until the test releases it.
#[derive(Default)]
pub struct ReadGate {
    armed: AtomicBool,
    pub started: Notify,
    pub release: Notify,
}

impl ReadGate {
    /// Pause the next read.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

/// In-memory filesystem whose reads can be paused through a [`ReadGate`].
pub struct GatedFs {
    inner: Arc<MemoryFs>,
    gate: Arc<ReadGate>,
}

#[async_trait]
impl FileSystem for GatedFs {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        if self.gate.armed.swap(false, Ordering::SeqCst) {
            self.gate.started.notify_one();
            self.gate.release.notified().await;
        }
        self.inner.read_to_string(path).await
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }
}

// =============================================================================
// Fixture
// =============================================================================

pub struct Fixture {
    pub host: TestHost,
    pub router: Arc<ModuleRouter>,
    pub build: BuildOptions,
    pub fs: Arc<MemoryFs>,
    pub gate: Arc<ReadGate>,
    pub sfc: Arc<StubSfc>,
    pub template: Arc<CountingTemplate>,
    pub style: Arc<CountingStyle>,
    pub markup: Arc<StubMarkup>,
}

pub struct FixtureBuilder {
    options: MontageOptions,
    build: BuildOptions,
    files: Vec<(PathBuf, String)>,
    pug: bool,
}

impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            options: MontageOptions::default(),
            build: BuildOptions {
                working_dir: PathBuf::from(ROOT),
                ..Default::default()
            },
            files: Vec::new(),
            pug: false,
        }
    }

    pub fn options(mut self, options: MontageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(mut self, f: impl FnOnce(&mut BuildOptions)) -> Self {
        f(&mut self.build);
        self
    }

    /// Add a file; `path` is relative to [`ROOT`].
    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((Path::new(ROOT).join(path), content.to_string()));
        self
    }

    pub fn with_pug(mut self) -> Self {
        self.pug = true;
        self
    }

    pub async fn setup(self) -> MontageResult<Fixture> {
        let fs = Arc::new(MemoryFs::new());
        for (path, content) in self.files {
            fs.insert(path, content);
        }

        let sfc = Arc::new(StubSfc::default());
        let template = Arc::new(CountingTemplate::default());
        let style = Arc::new(CountingStyle::default());
        let markup = Arc::new(StubMarkup::default());

        let mut compilers = Compilers::new(
            sfc.clone(),
            template.clone(),
            style.clone(),
            markup.clone(),
        );
        if self.pug {
            compilers = compilers.with_template_preprocessor("pug", Arc::new(StubPug));
        }

        let gate = Arc::new(ReadGate::default());
        let gated = Arc::new(GatedFs {
            inner: fs.clone(),
            gate: gate.clone(),
        });

        let mut host = TestHost::default();
        let mut build = self.build;
        let router = MontagePlugin::new(self.options, compilers)
            .with_fs(gated)
            .setup(&mut build, &mut host)
            .await?;

        Ok(Fixture {
            host,
            router,
            build,
            fs,
            gate,
            sfc,
            template,
            style,
            markup,
        })
    }
}

impl Fixture {
    /// Absolute path of a file under [`ROOT`].
    pub fn path(&self, relative: &str) -> PathBuf {
        Path::new(ROOT).join(relative)
    }

    /// Resolve `specifier` from the project root, then load it.
    pub async fn import(&self, specifier: &str) -> LoadOutcome {
        let request = self
            .host
            .resolve(ResolveArgs::new(specifier).with_resolve_dir(ROOT))
            .await?
            .unwrap_or_else(|| panic!("{} did not resolve", specifier));
        self.host.load(&request).await
    }

    /// Load a component stub and return its code.
    pub async fn stub(&self, relative: &str) -> String {
        let result = self
            .host
            .load(&VirtualModuleRequest::file(self.path(relative)))
            .await
            .unwrap()
            .unwrap();
        result.contents.clone().unwrap()
    }

    pub fn template_calls(&self) -> usize {
        self.template.calls.load(Ordering::SeqCst)
    }

    pub fn style_calls(&self) -> usize {
        self.style.calls.load(Ordering::SeqCst)
    }
}

/// Every import specifier in a stub, in order.
pub fn stub_imports(stub: &str) -> Vec<String> {
    let re = Regex::new(r#"(?:from |import )"([^"]+)""#).unwrap();
    re.captures_iter(stub).map(|c| c[1].to_string()).collect()
}

pub const APP: &str = r#"<script setup lang="ts">
const msg = "hi"
</script>

<template>
  <div>{{ msg }}</div>
</template>

<style scoped>
.a { color: red; }
</style>
<style>
.b { color: blue; }
</style>
"#;
