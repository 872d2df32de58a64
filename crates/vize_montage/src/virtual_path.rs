//! Virtual module addressing.
//!
//! One physical `.vue` file fans out into several virtual modules:
//!
//! ```text
//! /src/App.vue                     file namespace (stub)
//! /src/App.vue?type=script         sfc-script
//! /src/App.vue?type=template       sfc-template
//! /src/App.vue?type=style&index=1  sfc-style, second style block
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vize_carton::path::{escape_js_path, split_query};

use crate::error::{MontageError, MontageResult};

/// Namespace a resolved request is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "sfc-script")]
    Script,
    #[serde(rename = "sfc-template")]
    Template,
    #[serde(rename = "sfc-style")]
    Style,
}

impl Namespace {
    /// The namespace string handed to the host.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Script => "sfc-script",
            Self::Template => "sfc-template",
            Self::Style => "sfc-style",
        }
    }

    /// Value of the `type` query parameter, `None` for the file namespace.
    pub fn query_type(self) -> Option<&'static str> {
        match self {
            Self::File => None,
            Self::Script => Some("script"),
            Self::Template => Some("template"),
            Self::Style => Some("style"),
        }
    }

    fn from_query_type(ty: &str) -> Option<Self> {
        match ty {
            "script" => Some(Self::Script),
            "template" => Some(Self::Template),
            "style" => Some(Self::Style),
            _ => None,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A routed request: physical path, namespace and style index.
///
/// Also the memo cache key, so two style blocks of one file never share an
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualModuleRequest {
    pub path: PathBuf,
    pub namespace: Namespace,
    /// Style block index; only set in the style namespace
    pub index: Option<usize>,
}

impl VirtualModuleRequest {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            namespace: Namespace::File,
            index: None,
        }
    }

    pub fn script(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            namespace: Namespace::Script,
            index: None,
        }
    }

    pub fn template(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            namespace: Namespace::Template,
            index: None,
        }
    }

    pub fn style(path: impl Into<PathBuf>, index: usize) -> Self {
        Self {
            path: path.into(),
            namespace: Namespace::Style,
            index: Some(index),
        }
    }

    /// Decode the query part of a specifier (without the leading `?`).
    ///
    /// Unknown parameters are ignored; an unknown `type` routes to the file
    /// namespace. A style request without `index` addresses block 0.
    pub fn from_query(path: impl Into<PathBuf>, query: Option<&str>) -> MontageResult<Self> {
        let path = path.into();
        let Some(query) = query else {
            return Ok(Self::file(path));
        };

        let mut namespace = Namespace::File;
        let mut index = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "type" => namespace = Namespace::from_query_type(value).unwrap_or(Namespace::File),
                "index" => {
                    index = Some(value.parse::<usize>().map_err(|_| {
                        MontageError::InvalidVirtualPath(format!(
                            "{}?{}: index must be a non-negative integer",
                            path.display(),
                            query
                        ))
                    })?);
                }
                _ => {}
            }
        }

        Ok(match namespace {
            Namespace::Style => Self::style(path, index.unwrap_or(0)),
            other => Self {
                path,
                namespace: other,
                index: None,
            },
        })
    }

    /// Decode a full specifier such as `App.vue?type=style&index=0`.
    pub fn parse(specifier: &str) -> MontageResult<Self> {
        let (path, query) = split_query(specifier);
        Self::from_query(path, query)
    }

    /// Import specifier for this request, as emitted into a stub module.
    pub fn specifier(&self) -> String {
        let path = escape_js_path(&self.path.to_string_lossy());
        match (self.namespace.query_type(), self.index) {
            (None, _) => path,
            (Some(ty), Some(index)) => format!("{}?type={}&index={}", path, ty, index),
            (Some(ty), None) => format!("{}?type={}", path, ty),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for VirtualModuleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.specifier(), self.namespace)
    }
}
