//! `file` namespace: the component stub module.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use vize_carton::path::{relative, to_slash};

use super::{LoadOutcome, LoadResult, Loader, ModuleRouter};
use crate::context::ComponentContext;
use crate::descriptor::SourceDocument;
use crate::error::MontageError;
use crate::scope_id::ScopeId;
use crate::virtual_path::VirtualModuleRequest;

impl ModuleRouter {
    pub(super) async fn compile_component(&self, path: &Path) -> LoadOutcome {
        let generation = self.contexts.generation(path);
        let source = self
            .fs
            .read_to_string(path)
            .await
            .map_err(|e| MontageError::io(path, e))?;
        let filename = relative(path, &self.config.cwd);

        let document = self.compilers.sfc.parse(&source, &filename)?;
        let scope_id = self.scope_ids.id_for(path, &filename);
        let script = if document.has_script() {
            Some(Arc::new(self.compilers.sfc.compile_script(&document, &scope_id)?))
        } else {
            None
        };

        let code = synthesize_stub(path, &filename, &document, &scope_id, self.config.render_ssr);
        tracing::debug!(
            "stub for {} (scope {}, {} styles)",
            filename.display(),
            scope_id,
            document.styles.len()
        );

        let context = ComponentContext {
            document: Arc::new(document),
            scope_id,
            script,
        };
        if self.contexts.insert(path, generation, context).is_none() {
            tracing::debug!("{} was invalidated while compiling", path.display());
        }

        let mut result = LoadResult::module(code, Loader::Js, path);
        result.watch_files.push(path.to_path_buf());
        Ok(Some(Arc::new(result)))
    }
}

/// Generate the stub module that stitches a component's virtual modules
/// together.
///
/// `filename` is the project-relative path recorded as `__file`.
pub fn synthesize_stub(
    path: &Path,
    filename: &Path,
    document: &SourceDocument,
    scope_id: &ScopeId,
    ssr: bool,
) -> String {
    let mut code = String::new();

    if document.has_script() {
        let _ = write!(
            code,
            "import script from \"{}\";",
            VirtualModuleRequest::script(path).specifier()
        );
    } else {
        code.push_str("const script = {};");
    }

    for index in 0..document.styles.len() {
        let _ = write!(
            code,
            "import \"{}\";",
            VirtualModuleRequest::style(path, index).specifier()
        );
    }

    let render = if ssr { "ssrRender" } else { "render" };
    let _ = write!(
        code,
        "import {{ {render} }} from \"{}\"; script.{render} = {render};",
        VirtualModuleRequest::template(path).specifier()
    );

    let _ = write!(code, "script.__file = {};", json_string(&to_slash(filename)));
    if document.has_scoped_style() {
        let _ = write!(code, "script.__scopeId = {};", json_string(&scope_id.data_attr()));
    }
    if ssr {
        code.push_str("script.__ssrInlineRender = true;");
    }

    code.push_str("export default script;");
    code
}

fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
