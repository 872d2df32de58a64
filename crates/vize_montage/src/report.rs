//! Build-end reporter.
//!
//! Hands the host's build manifest to an [`HtmlGenerator`] once the build
//! has finished without errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::diagnostic::Message;
use crate::error::{MontageError, MontageResult};
use crate::options::HtmlOptions;

/// What the host reports at the end of a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    #[serde(default)]
    pub errors: Vec<Message>,
    #[serde(default)]
    pub warnings: Vec<Message>,
    /// Module manifest: emitted files and their entry points
    #[serde(default)]
    pub metafile: Option<serde_json::Value>,
}

/// Generates an HTML document from a build manifest.
#[async_trait]
pub trait HtmlGenerator: Send + Sync {
    async fn generate(
        &self,
        metafile: &serde_json::Value,
        options: &HtmlOptions,
        minify: bool,
    ) -> MontageResult<()>;
}

/// Fill unset HTML options from the build's output directory.
///
/// `trimPath` defaults to the output directory, `pathPrefix` to `/` and
/// `outFile` to `index.html` inside the output directory.
pub fn resolve_html_options(mut options: HtmlOptions, out_dir: Option<&Path>) -> HtmlOptions {
    if options.trim_path.is_none() {
        options.trim_path = out_dir.map(Path::to_path_buf);
    }
    if options.path_prefix.is_none() {
        options.path_prefix = Some("/".to_string());
    }
    if options.out_file.is_none() {
        options.out_file = out_dir.map(|dir| dir.join("index.html"));
    }
    options
}

/// Output directory of a build: `outdir`, else the directory of `outfile`.
pub fn output_dir(outdir: Option<&Path>, outfile: Option<&Path>) -> Option<PathBuf> {
    outdir
        .map(Path::to_path_buf)
        .or_else(|| outfile.and_then(Path::parent).map(Path::to_path_buf))
}

/// Runs HTML generation at the end of a successful build.
pub struct BuildEndReporter {
    options: HtmlOptions,
    minify: bool,
    generator: Option<Arc<dyn HtmlGenerator>>,
}

impl BuildEndReporter {
    /// `options` must already be resolved with [`resolve_html_options`].
    pub fn new(options: HtmlOptions, minify: bool, generator: Option<Arc<dyn HtmlGenerator>>) -> Self {
        Self {
            options,
            minify,
            generator,
        }
    }

    pub fn options(&self) -> &HtmlOptions {
        &self.options
    }

    /// Generate the document. Returns `false` when the build had errors.
    pub async fn on_end(&self, result: &BuildResult) -> MontageResult<bool> {
        if !result.errors.is_empty() {
            tracing::debug!(
                "skipping HTML generation: build has {} errors",
                result.errors.len()
            );
            return Ok(false);
        }

        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| MontageError::missing_optional("html generator", "HTML generation"))?;
        let metafile = result
            .metafile
            .as_ref()
            .ok_or_else(|| MontageError::External("build result has no metafile".to_string()))?;

        tracing::info!(
            "generating {}",
            self.options
                .out_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "index.html".to_string())
        );
        generator.generate(metafile, &self.options, self.minify).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(HtmlOptions, bool)>>,
    }

    #[async_trait]
    impl HtmlGenerator for Recorder {
        async fn generate(
            &self,
            _metafile: &serde_json::Value,
            options: &HtmlOptions,
            minify: bool,
        ) -> MontageResult<()> {
            self.calls.lock().push((options.clone(), minify));
            Ok(())
        }
    }

    #[test]
    fn test_resolve_defaults() {
        let options = resolve_html_options(HtmlOptions::default(), Some(Path::new("dist")));
        assert_eq!(options.trim_path, Some(PathBuf::from("dist")));
        assert_eq!(options.path_prefix.as_deref(), Some("/"));
        assert_eq!(options.out_file, Some(PathBuf::from("dist/index.html")));
    }

    #[test]
    fn test_resolve_keeps_explicit_values() {
        let options = resolve_html_options(
            HtmlOptions {
                path_prefix: Some("/app/".into()),
                out_file: Some("public/main.html".into()),
                ..Default::default()
            },
            None,
        );
        assert_eq!(options.path_prefix.as_deref(), Some("/app/"));
        assert_eq!(options.out_file, Some(PathBuf::from("public/main.html")));
        assert_eq!(options.trim_path, None);
    }

    #[test]
    fn test_output_dir() {
        assert_eq!(
            output_dir(Some(Path::new("out")), Some(Path::new("x/a.js"))),
            Some(PathBuf::from("out"))
        );
        assert_eq!(
            output_dir(None, Some(Path::new("x/a.js"))),
            Some(PathBuf::from("x"))
        );
        assert_eq!(output_dir(None, None), None);
    }

    #[tokio::test]
    async fn test_on_end_runs_only_without_errors() {
        let recorder = Arc::new(Recorder::default());
        let reporter = BuildEndReporter::new(
            resolve_html_options(HtmlOptions::default(), Some(Path::new("dist"))),
            true,
            Some(recorder.clone() as Arc<dyn HtmlGenerator>),
        );

        let failed = BuildResult {
            errors: vec![Message::text("boom")],
            metafile: Some(serde_json::json!({})),
            ..Default::default()
        };
        assert!(!reporter.on_end(&failed).await.unwrap());
        assert!(recorder.calls.lock().is_empty());

        let ok = BuildResult {
            metafile: Some(serde_json::json!({ "outputs": {} })),
            ..Default::default()
        };
        assert!(reporter.on_end(&ok).await.unwrap());
        let calls = recorder.calls.lock();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1);
    }

    #[tokio::test]
    async fn test_on_end_without_generator() {
        let reporter = BuildEndReporter::new(HtmlOptions::default(), false, None);
        let err = reporter
            .on_end(&BuildResult {
                metafile: Some(serde_json::json!({})),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MontageError::MissingOptional { .. }));
    }
}
