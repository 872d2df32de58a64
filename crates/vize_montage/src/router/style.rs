//! `sfc-style` namespace.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vize_carton::path::strip_query;

use super::{LoadOutcome, LoadResult, Loader, ModuleRouter};
use crate::compilers::{StyleCompileRequest, StyleError, StyleImporter};
use crate::context::ComponentContext;
use crate::diagnostic::{map_location, FragmentLocation, Location, Message};

impl ModuleRouter {
    pub(super) async fn compile_style_module(
        &self,
        path: &Path,
        index: usize,
        context: Arc<ComponentContext>,
    ) -> LoadOutcome {
        let style = context.document.style(path, index)?;
        let postcss = self.config.postcss.clone().unwrap_or_default();

        let request = StyleCompileRequest {
            filename: path.to_path_buf(),
            id: context.data_id(),
            source: style.content.clone(),
            scoped: style.scoped,
            preprocess_lang: style.lang.clone(),
            postcss_options: postcss.options,
            postcss_plugins: postcss.plugins,
            include_paths: path.parent().map(Path::to_path_buf).into_iter().collect(),
            importers: self.style_importers(),
        };
        let output = self.compilers.style.compile(request).await;

        if !output.errors.is_empty() {
            let errors = output
                .errors
                .iter()
                .map(|err| style_message(err, style.range.start_line, path))
                .collect();
            return Ok(Some(Arc::new(LoadResult::failed(errors))));
        }

        let mut result = LoadResult::module(output.code, Loader::Css, path);
        result.watch_files = output.dependencies;
        Ok(Some(Arc::new(result)))
    }

    /// Fallback resolvers for preprocessor imports: `node_modules`, then aliases.
    fn style_importers(&self) -> Vec<StyleImporter> {
        let fs = Arc::clone(&self.fs);
        let node_modules = self.config.cwd.join("node_modules");
        let from_modules: StyleImporter = Arc::new(move |url: &str| {
            let candidate = node_modules.join(url);
            fs.is_file(&candidate).then_some(candidate)
        });

        let aliases = Arc::clone(&self.aliases);
        let from_aliases: StyleImporter =
            Arc::new(move |url: &str| Some(PathBuf::from(aliases.replace_or_keep(url))));

        vec![from_modules, from_aliases]
    }
}

/// Map a style error; only errors raised in this fragment are shifted.
fn style_message(err: &StyleError, start_line: u32, path: &Path) -> Message {
    let origin = err.file.as_deref().map(strip_query);
    let mut location = match origin {
        Some(file) if Path::new(file) != path => Location {
            file: file.to_string(),
            line: err.line,
            column: err.column,
            line_text: None,
            namespace: None,
        },
        _ => map_location(&FragmentLocation::new(err.line, err.column), start_line, path),
    };
    location.namespace = Some("file".to_string());
    Message::at(err.message.clone(), location)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(file: Option<&str>, line: u32) -> StyleError {
        StyleError {
            message: "Undefined variable".into(),
            file: file.map(str::to_string),
            line,
            column: 3,
        }
    }

    #[test]
    fn test_own_errors_are_shifted() {
        let path = Path::new("/p/App.vue");
        let message = style_message(&error(Some("/p/App.vue?type=style&index=0"), 2), 10, path);
        let location = message.location.unwrap();
        assert_eq!(location.file, "/p/App.vue");
        assert_eq!(location.line, 12);
        assert_eq!(location.column, 3);
        assert_eq!(location.namespace.as_deref(), Some("file"));

        let unattributed = style_message(&error(None, 2), 10, path);
        assert_eq!(unattributed.location.unwrap().line, 12);
    }

    #[test]
    fn test_cross_file_errors_keep_their_location() {
        let message = style_message(
            &error(Some("/p/styles/_vars.scss"), 4),
            10,
            Path::new("/p/App.vue"),
        );
        let location = message.location.unwrap();
        assert_eq!(location.file, "/p/styles/_vars.scss");
        assert_eq!(location.line, 4);
    }
}
