/// A regex based sub-resolver for application nodes
use crate::application::services::plugin_registry::{PageView, ResolverMatch, SubResolver};
use regex::Regex;
use std::collections::BTreeMap;

struct UrlPattern {
    regex: Regex,
    name: Option<String>,
    view: PageView,
}

/// Ordered URL patterns below an application node; the first match wins.
///
/// Patterns are matched against the sub-path without its leading slash, so
/// `^$` is the node's own URL and `^(?P<year>\d{4})/$` matches `/2024/`.
/// When a pattern has named groups only those are passed on, as keyword
/// arguments; otherwise every group becomes a positional argument.
#[derive(Default)]
pub struct PatternResolver {
    patterns: Vec<UrlPattern>,
}

impl PatternResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, pattern: &str, name: Option<&str>, view: PageView) -> Result<Self, regex::Error> {
        self.patterns.push(UrlPattern {
            regex: Regex::new(pattern)?,
            name: name.map(str::to_string),
            view,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl SubResolver for PatternResolver {
    fn resolve(&self, sub_path: &str) -> Option<ResolverMatch> {
        let target = sub_path.strip_prefix('/').unwrap_or(sub_path);

        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.regex.captures(target)?;

            let mut kwargs = BTreeMap::new();
            for group in pattern.regex.capture_names().flatten() {
                if let Some(value) = captures.name(group) {
                    kwargs.insert(group.to_string(), value.as_str().to_string());
                }
            }

            let args = if kwargs.is_empty() {
                captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect()
            } else {
                Vec::new()
            };

            Some(ResolverMatch {
                view: pattern.view.clone(),
                url_name: pattern.name.clone(),
                args,
                kwargs,
            })
        })
    }
}
