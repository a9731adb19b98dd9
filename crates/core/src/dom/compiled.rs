// ABOUTME: Pre-compiled CSS selector cache shared by the noise stripper, tiers and sanitizer.
// ABOUTME: Profile rule tables are compiled once per process and reused for every page.

//! Compiled rule selectors.
//!
//! A crawl applies the same profile tables to every page it visits. Each
//! selector string maps to its [`Matcher`] (or to `None` when it does not
//! compile) in one process-wide table.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use dom_query::Matcher;
use once_cell::sync::Lazy;

static SELECTOR_CACHE: Lazy<RwLock<HashMap<String, Option<Matcher>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// The matcher for `css`, compiling it on first use.
///
/// A selector that fails to compile yields `None`, and that outcome is
/// remembered as well, so a broken profile rule costs one parse per process.
pub fn get_or_compile(css: &str) -> Option<Matcher> {
    {
        let cache = SELECTOR_CACHE
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(css) {
            return cached.clone();
        }
    }

    let compiled = Matcher::new(css).ok();
    let mut cache = SELECTOR_CACHE
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(cached) = cache.get(css) {
        return cached.clone();
    }
    cache.insert(css.to_string(), compiled.clone());
    compiled
}
