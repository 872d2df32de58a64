//! Path helpers shared by the resolver and loaders.
//!
//! Everything here is lexical: no function touches the filesystem, so the
//! results are the same whether or not the paths exist.

use std::path::{Component, Path, PathBuf};

/// Lexically normalise a path, dropping `.` and folding `..` into the
/// preceding component where possible.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is still `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Make `path` absolute against `cwd` and normalise it.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&cwd.join(path))
    }
}

/// Compute `path` relative to `base`, the way `path.relative` does in Node.
///
/// Both inputs are normalised first. Returns an empty path when they are equal.
pub fn relative(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);

    let path_components: Vec<_> = path.components().collect();
    let base_components: Vec<_> = base.components().collect();

    let common = path_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base_components.len() {
        out.push("..");
    }
    for component in &path_components[common..] {
        out.push(component.as_os_str());
    }
    out
}

/// Render a path with forward slashes regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Escape a filesystem path for use inside a double-quoted JS string literal.
pub fn escape_js_path(path: &str) -> String {
    path.replace('\\', "\\\\")
}

/// Split an import specifier into its path and query parts.
///
/// `"App.vue?type=style&index=0"` becomes `("App.vue", Some("type=style&index=0"))`.
pub fn split_query(specifier: &str) -> (&str, Option<&str>) {
    match specifier.find('?') {
        Some(pos) => (&specifier[..pos], Some(&specifier[pos + 1..])),
        None => (specifier, None),
    }
}

/// Drop any `?query` suffix from a specifier.
#[inline]
pub fn strip_query(specifier: &str) -> &str {
    split_query(specifier).0
}
