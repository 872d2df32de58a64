//! `sfc-script` namespace and standalone markup files.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;

use super::{LoadOutcome, LoadResult, Loader, ModuleRouter};
use crate::context::ComponentContext;
use crate::descriptor::ScriptLang;
use crate::error::MontageError;

const SOURCE_MAP_PREFIX: &str =
    "\n\n//@ sourceMappingURL=data:application/json;charset=utf-8;base64,";

impl Loader {
    /// Loader for compiled script output in `lang`.
    pub fn for_script(lang: ScriptLang) -> Self {
        if lang.is_typed() {
            Loader::Ts
        } else {
            Loader::Js
        }
    }
}

impl ModuleRouter {
    pub(super) async fn compile_script_module(
        &self,
        path: &Path,
        context: Arc<ComponentContext>,
    ) -> LoadOutcome {
        let Some(script) = context.script.as_deref() else {
            return Ok(None);
        };

        let lang = ScriptLang::parse(script.lang.as_deref()).ok_or_else(|| {
            MontageError::UnsupportedScriptLang {
                path: path.to_path_buf(),
                lang: script.lang.clone().unwrap_or_default(),
            }
        })?;

        let mut code = script.content.clone();
        if self.config.sourcemap {
            if let Some(map) = &script.map {
                code.push_str(SOURCE_MAP_PREFIX);
                code.push_str(&base64::engine::general_purpose::STANDARD.encode(map.to_string()));
            }
        }

        if lang.has_markup() {
            code = self
                .compilers
                .markup
                .transform(&code, path)
                .await
                .ok_or_else(|| MontageError::ScriptTransform {
                    path: path.to_path_buf(),
                    lang: lang.to_string(),
                })?
                .code;
        }

        Ok(Some(Arc::new(LoadResult::module(
            code,
            Loader::for_script(lang),
            path,
        ))))
    }

    pub(super) async fn compile_markup_file(&self, path: &Path) -> LoadOutcome {
        let source = self
            .fs
            .read_to_string(path)
            .await
            .map_err(|e| MontageError::io(path, e))?;

        let Some(output) = self.compilers.markup.transform(&source, path).await else {
            tracing::debug!("markup transform produced nothing for {}", path.display());
            return Ok(None);
        };

        let lang = ScriptLang::parse(path.extension().and_then(|e| e.to_str()))
            .unwrap_or(ScriptLang::Jsx);
        let mut result = LoadResult::module(output.code, Loader::for_script(lang), path);
        result.watch_files.push(path.to_path_buf());
        Ok(Some(Arc::new(result)))
    }
}
