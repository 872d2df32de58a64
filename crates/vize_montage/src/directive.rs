//! Custom directive transforms.
//!
//! Projects can tell the template compiler what to do with directives it
//! does not know: turn them into a prop (statically named or named by a
//! handler) or drop them. The template compiler calls [`DirectiveTransforms::apply`]
//! for every custom directive it encounters.

use std::fmt;
use std::sync::Arc;

use vize_carton::FxHashMap;

use crate::diagnostic::FragmentLocation;

/// A directive occurrence in a template, as seen by a transform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveNode {
    /// Directive name without the `v-` prefix
    pub name: String,
    /// Argument (`v-foo:arg`)
    pub arg: Option<String>,
    /// Expression source (`v-foo="exp"`)
    pub exp: Option<String>,
    /// Modifiers (`v-foo.a.b`)
    pub modifiers: Vec<String>,
    pub loc: Option<FragmentLocation>,
}

/// A generated element property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveProperty {
    /// JSON-quoted property name
    pub key: String,
    /// Expression source, `void 0` when the directive had no expression
    pub value: String,
    pub loc: Option<FragmentLocation>,
}

/// Handler deciding the prop name for a directive occurrence; `None` drops it.
pub type DirectiveHandler = Arc<dyn Fn(&DirectiveNode) -> Option<String> + Send + Sync>;

/// What to do with one custom directive.
#[derive(Clone)]
pub enum DirectiveTransform {
    /// Ask a handler for the prop name.
    Handler(DirectiveHandler),
    /// Always emit this prop name.
    Prop(String),
    /// Drop the directive.
    Drop,
}

impl fmt::Debug for DirectiveTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Prop(name) => f.debug_tuple("Prop").field(name).finish(),
            Self::Drop => f.write_str("Drop"),
        }
    }
}

/// Directive name to transform.
#[derive(Debug, Clone, Default)]
pub struct DirectiveTransforms {
    transforms: FxHashMap<String, DirectiveTransform>,
}

impl DirectiveTransforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform for `name` (without the `v-` prefix).
    pub fn insert(&mut self, name: impl Into<String>, transform: DirectiveTransform) {
        self.transforms.insert(name.into(), transform);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, transform: DirectiveTransform) -> Self {
        self.insert(name, transform);
        self
    }

    /// Register a handler closure.
    pub fn with_handler<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&DirectiveNode) -> Option<String> + Send + Sync + 'static,
    {
        self.with(name, DirectiveTransform::Handler(Arc::new(handler)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Registered directive names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Properties produced for `dir`, or `None` if the directive is not registered.
    pub fn apply(&self, dir: &DirectiveNode) -> Option<Vec<DirectiveProperty>> {
        let transform = self.transforms.get(&dir.name)?;
        let prop_name = match transform {
            DirectiveTransform::Handler(handler) => handler(dir),
            DirectiveTransform::Prop(name) => Some(name.clone()),
            DirectiveTransform::Drop => None,
        };

        Some(
            prop_name
                .map(|name| vec![property(dir, &name)])
                .unwrap_or_default(),
        )
    }
}

fn property(dir: &DirectiveNode, name: &str) -> DirectiveProperty {
    DirectiveProperty {
        key: serde_json::Value::String(name.to_string()).to_string(),
        value: dir.exp.clone().unwrap_or_else(|| "void 0".to_string()),
        loc: dir.loc.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(name: &str, exp: Option<&str>) -> DirectiveNode {
        DirectiveNode {
            name: name.to_string(),
            exp: exp.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_static_prop() {
        let transforms =
            DirectiveTransforms::new().with("tooltip", DirectiveTransform::Prop("title".into()));

        let props = transforms
            .apply(&directive("tooltip", Some("msg")))
            .unwrap();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].key, "\"title\"");
        assert_eq!(props[0].value, "msg");
    }

    #[test]
    fn test_missing_expression_is_void() {
        let transforms =
            DirectiveTransforms::new().with("focus", DirectiveTransform::Prop("autofocus".into()));
        let props = transforms.apply(&directive("focus", None)).unwrap();
        assert_eq!(props[0].value, "void 0");
    }

    #[test]
    fn test_drop() {
        let transforms = DirectiveTransforms::new().with("debug", DirectiveTransform::Drop);
        assert_eq!(transforms.apply(&directive("debug", None)), Some(vec![]));
    }

    #[test]
    fn test_handler() {
        let transforms = DirectiveTransforms::new().with_handler("t", |dir| {
            dir.arg.as_ref().map(|arg| format!("data-{}", arg))
        });

        let mut dir = directive("t", Some("key"));
        assert_eq!(transforms.apply(&dir), Some(vec![]));

        dir.arg = Some("label".into());
        let props = transforms.apply(&dir).unwrap();
        assert_eq!(props[0].key, "\"data-label\"");
    }

    #[test]
    fn test_unregistered() {
        let transforms = DirectiveTransforms::new();
        assert!(transforms.apply(&directive("x", None)).is_none());
        assert!(transforms.is_empty());
    }

    #[test]
    fn test_names_sorted() {
        let transforms = DirectiveTransforms::new()
            .with("b", DirectiveTransform::Drop)
            .with("a", DirectiveTransform::Drop);
        assert_eq!(transforms.names(), vec!["a", "b"]);
        assert!(transforms.contains("a"));
    }
}
