//! Path alias resolution.
//!
//! Rules are `pattern -> replacement` pairs in tsconfig `paths` syntax: a
//! trailing `*` makes the rule a prefix match, otherwise it matches the whole
//! specifier. Rewriting is pure; existence probing goes through a caller
//! supplied predicate so the resolver can be exercised without real I/O.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vize_carton::path::{absolutize, normalize, to_slash};

use crate::fs::FileSystem;
use crate::options::PathAliases;

/// Suffixes probed, in order, when the rewritten path is not a file itself.
pub const RESOLVE_FALLBACKS: &[&str] = &[
    ".ts",
    ".tsx",
    "/index.ts",
    "/index.tsx",
    ".js",
    ".jsx",
    "/index.js",
    "/index.jsx",
];

/// How multiple matching rules combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AliasPolicy {
    /// The first matching rule rewrites the specifier; later rules are ignored.
    #[default]
    FirstMatch,
    /// Every rule is tried in order against the output of the previous one.
    Sequential,
}

/// One alias rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRule {
    /// Pattern with any trailing `*` removed
    pattern: String,
    /// Replacement with any trailing `*` removed
    replacement: String,
    /// Whether the pattern ended in `*`
    wildcard: bool,
}

impl AliasRule {
    /// Build a rule; a relative `target` is anchored at `base`.
    pub fn new(pattern: &str, target: &str, base: &Path) -> Self {
        let wildcard = pattern.ends_with('*');
        let pattern = pattern.trim_end_matches('*').to_string();
        let target = target.trim_end_matches('*');

        let mut replacement = to_slash(&absolutize(Path::new(target), base));
        if wildcard
            && (target.is_empty() || target.ends_with('/'))
            && !replacement.ends_with('/')
        {
            replacement.push('/');
        }

        Self {
            pattern,
            replacement,
            wildcard,
        }
    }

    /// Rewrite `specifier` if this rule matches it.
    pub fn apply(&self, specifier: &str) -> Option<String> {
        if self.wildcard {
            specifier
                .strip_prefix(&self.pattern)
                .map(|rest| format!("{}{}", self.replacement, rest))
        } else if specifier == self.pattern {
            Some(self.replacement.clone())
        } else {
            None
        }
    }
}

/// Ordered alias rules plus the policy combining them.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    rules: Vec<AliasRule>,
    policy: AliasPolicy,
}

impl AliasResolver {
    pub fn new(rules: Vec<AliasRule>, policy: AliasPolicy) -> Self {
        Self { rules, policy }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Rewrite `specifier`; `None` when no rule matched.
    pub fn replace(&self, specifier: &str) -> Option<String> {
        match self.policy {
            AliasPolicy::FirstMatch => self.rules.iter().find_map(|rule| rule.apply(specifier)),
            AliasPolicy::Sequential => {
                let mut current: Option<String> = None;
                for rule in &self.rules {
                    let input = current.as_deref().unwrap_or(specifier);
                    if let Some(next) = rule.apply(input) {
                        current = Some(next);
                    }
                }
                current
            }
        }
    }

    /// Rewrite `specifier`, returning it unchanged when no rule matched.
    pub fn replace_or_keep(&self, specifier: &str) -> String {
        self.replace(specifier)
            .unwrap_or_else(|| specifier.to_string())
    }

    /// Rewrite `specifier` and locate an existing file for it.
    ///
    /// Relative results are anchored at `cwd`. Returns `None` (defer to the
    /// host's own resolution) when no rule applies or nothing exists.
    pub fn resolve(
        &self,
        specifier: &str,
        cwd: &Path,
        exists: impl Fn(&Path) -> bool,
    ) -> Option<PathBuf> {
        let aliased = self.replace(specifier)?;
        let full_path = absolutize(Path::new(&aliased), cwd);

        if exists(&full_path) {
            return Some(full_path);
        }

        let base = full_path.to_string_lossy();
        RESOLVE_FALLBACKS.iter().find_map(|suffix| {
            let candidate = PathBuf::from(format!("{}{}", base, suffix));
            exists(&candidate).then(|| normalize(&candidate))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: TsCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsCompilerOptions {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: serde_json::Map<String, serde_json::Value>,
}

/// Build alias rules from configuration.
///
/// `PathAliases::Enabled(true)` reads `compilerOptions.paths` from `tsconfig`
/// (relative to `cwd`). A missing tsconfig yields no rules; an invalid one is
/// reported and yields no rules.
pub async fn load_rules(
    source: &PathAliases,
    tsconfig: &Path,
    cwd: &Path,
    fs: &dyn FileSystem,
) -> Vec<AliasRule> {
    match source {
        PathAliases::Enabled(false) => Vec::new(),
        PathAliases::Rules(rules) => rules_from_map(rules, cwd),
        PathAliases::Enabled(true) => {
            let tsconfig = absolutize(tsconfig, cwd);
            if !fs.is_file(&tsconfig) {
                tracing::debug!("no tsconfig at {}, path aliases disabled", tsconfig.display());
                return Vec::new();
            }

            let mut content = match fs.read_to_string(&tsconfig).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", tsconfig.display(), e);
                    return Vec::new();
                }
            };

            if let Err(e) = json_strip_comments::strip(&mut content) {
                tracing::warn!("Failed to parse {}: {}", tsconfig.display(), e);
                return Vec::new();
            }

            let config: TsConfig = match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", tsconfig.display(), e);
                    return Vec::new();
                }
            };

            let config_dir = tsconfig.parent().unwrap_or(cwd);
            let base = match &config.compiler_options.base_url {
                Some(base_url) => absolutize(Path::new(base_url), config_dir),
                None => config_dir.to_path_buf(),
            };
            rules_from_map(&config.compiler_options.paths, &base)
        }
    }
}

/// Convert a `paths`-style map, taking the first target of array values.
fn rules_from_map(map: &serde_json::Map<String, serde_json::Value>, base: &Path) -> Vec<AliasRule> {
    map.iter()
        .filter_map(|(pattern, targets)| {
            let target = match targets {
                serde_json::Value::String(target) => Some(target.as_str()),
                serde_json::Value::Array(targets) => targets.first().and_then(|t| t.as_str()),
                _ => None,
            };
            if target.is_none() {
                tracing::warn!("ignoring path alias \"{}\": no target", pattern);
            }
            target.map(|target| AliasRule::new(pattern, target, base))
        })
        .collect()
}
