// ABOUTME: Denylist-driven boilerplate removal for container subtrees.
// ABOUTME: Evaluates an ordered table of NoiseRules and removes every matching descendant in place.

use dom_query::{Matcher, Selection};
use tracing::warn;

use crate::dom::compiled::get_or_compile;
use crate::profile::NoiseRule;

/// Removes boilerplate subtrees according to a fixed rule table.
///
/// Rules are compiled once when the stripper is built; rules whose selector
/// does not compile are logged and skipped.
#[derive(Clone)]
pub struct NoiseStripper {
    matchers: Vec<(NoiseRule, Matcher)>,
}

impl std::fmt::Debug for NoiseStripper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.matchers.iter().map(|(rule, _)| rule))
            .finish()
    }
}

impl NoiseStripper {
    /// Compiles a rule table.
    pub fn new(rules: &[NoiseRule]) -> Self {
        let matchers = rules
            .iter()
            .filter_map(|rule| {
                let css = rule.to_css();
                match get_or_compile(&css) {
                    Some(matcher) => Some((rule.clone(), matcher)),
                    None => {
                        warn!(rule = ?rule, css = %css, "skipping noise rule with invalid selector");
                        None
                    }
                }
            })
            .collect();
        Self { matchers }
    }

    /// Number of usable rules.
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Removes every descendant of `container` matched by any rule.
    ///
    /// The container itself is never removed. Returns how many elements were
    /// matched; nested matches are counted once per rule that hit them.
    pub fn strip(&self, container: &Selection) -> usize {
        let mut removed = 0;
        for (_, matcher) in &self.matchers {
            let matched = container.select_matcher(matcher);
            removed += matched.length();
            if matched.exists() {
                matched.remove();
            }
        }
        removed
    }
}
