//! `sfc-template` namespace.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::{LoadOutcome, LoadResult, Loader, ModuleRouter};
use crate::compilers::{TemplateCompileRequest, TemplateError, OPTIONAL_TEMPLATE_LANGS};
use crate::context::ComponentContext;
use crate::descriptor::TemplateFragment;
use crate::diagnostic::{map_location, Message};
use crate::error::{MontageError, MontageResult};

/// Shorthand attributes whose value repeats their own name, e.g.
/// `#default="#default"` or `v-else="v-else"`.
static SELF_REFERENCE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(\B#[^\s"'=<>/]*|\bv-[^\s"'=<>/]*)="([^"]*)""#).ok());

/// Collapse self-referential shorthand attributes to bare attributes.
///
/// Template preprocessors render boolean attributes as `name="name"`, which
/// is not valid for slot and directive shorthands. Other attributes are left
/// untouched.
pub fn fix_self_references(source: &str) -> Cow<'_, str> {
    let Some(re) = SELF_REFERENCE.as_ref() else {
        return Cow::Borrowed(source);
    };
    re.replace_all(source, |caps: &Captures<'_>| {
        if caps[1] == caps[2] {
            caps[1].to_string()
        } else {
            caps[0].to_string()
        }
    })
}

impl ModuleRouter {
    pub(super) async fn compile_template_module(
        &self,
        path: &Path,
        context: Arc<ComponentContext>,
    ) -> LoadOutcome {
        let document = &context.document;
        let template = document
            .template
            .as_ref()
            .ok_or_else(|| MontageError::MissingTemplate {
                path: path.to_path_buf(),
            })?;

        let request = TemplateCompileRequest {
            id: context.data_id(),
            source: self.preprocess_template(template, path)?,
            filename: path.to_path_buf(),
            scoped: document.has_scoped_style(),
            slotted: document.slotted,
            ssr: self.config.render_ssr,
            ssr_css_vars: Vec::new(),
            is_prod: self.config.is_prod,
            directive_transforms: Arc::clone(&self.config.directive_transforms),
            binding_metadata: context.script.as_ref().and_then(|s| s.bindings.clone()),
        };
        let output = self.compilers.template.compile(&request);

        if !output.errors.is_empty() {
            let errors = output
                .errors
                .iter()
                .map(|err| template_message(err, template.range.start_line, path))
                .collect();
            return Ok(Some(Arc::new(LoadResult::failed(errors))));
        }

        let mut result = LoadResult::module(output.code, Loader::Js, path);
        result.warnings = output.tips.into_iter().map(Message::text).collect();
        Ok(Some(Arc::new(result)))
    }

    /// Expand a shorthand template language, if the template declares one.
    fn preprocess_template(&self, template: &TemplateFragment, path: &Path) -> MontageResult<String> {
        let lang = match template.lang.as_deref() {
            None | Some("html") => return Ok(template.content.clone()),
            Some(lang) => lang,
        };

        match self.compilers.template_preprocessor(lang) {
            Some(preprocessor) => {
                let html = preprocessor.render(&template.content, path)?;
                Ok(fix_self_references(&html).into_owned())
            }
            None => match OPTIONAL_TEMPLATE_LANGS.iter().find(|(name, _)| *name == lang) {
                Some((package, purpose)) => Err(MontageError::missing_optional(package, purpose)),
                None => Ok(template.content.clone()),
            },
        }
    }
}

fn template_message(err: &TemplateError, start_line: u32, path: &Path) -> Message {
    match &err.loc {
        Some(loc) => Message::at(err.message.clone(), map_location(loc, start_line, path)),
        None => Message::text(err.message.clone()),
    }
}
