//! Localized label lookup.
//!
//! # Responsibility
//! - Resolve user-facing labels for dimensions, units, formatters and fields
//!   by key.
//! - Expand `%1`..`%9` parameter placeholders in label templates.
//!
//! # Invariants
//! - Lookup never fails: a missing key resolves to `#<key>` so gaps are
//!   visible in the UI instead of aborting the caller.
//! - Short labels fall back to the full label when no `<key>_short` entry
//!   exists.

use log::debug;
use std::collections::HashMap;

/// Prefix of the sentinel returned for keys without a catalog entry.
pub const MISSING_PREFIX: &str = "#";
/// Suffix appended to a key to find its short label.
pub const SHORT_SUFFIX: &str = "_short";
/// Replacement for a `%N` placeholder without a matching parameter.
const MISSING_PARAMETER: &str = "??";
const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// Source of localized label templates.
pub trait LabelLookup: Send + Sync {
    /// Returns the raw template for `key`, or `None` when it is absent.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Symbol substituted into currency-style unit labels.
    fn currency_symbol(&self) -> String {
        DEFAULT_CURRENCY_SYMBOL.to_string()
    }

    fn label(&self, key: &str) -> String {
        self.label_with(key, &[])
    }

    /// Resolves `key` and expands `%N` placeholders with `params`.
    fn label_with(&self, key: &str, params: &[&str]) -> String {
        match self.lookup(key) {
            Some(template) => expand_template(&template, params),
            None => {
                debug!("event=label_lookup module=text status=missing key={key}");
                format!("{MISSING_PREFIX}{key}")
            }
        }
    }

    fn short_label(&self, key: &str) -> String {
        self.short_label_with(key, &[])
    }

    fn short_label_with(&self, key: &str, params: &[&str]) -> String {
        match self.lookup(&format!("{key}{SHORT_SUFFIX}")) {
            Some(template) => expand_template(&template, params),
            None => self.label_with(key, params),
        }
    }
}

/// In-memory label catalog.
#[derive(Debug, Clone, Default)]
pub struct TextCatalog {
    strings: HashMap<String, String>,
    currency_symbol: Option<String>,
}

impl TextCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from `(key, template)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut catalog = Self::new();
        for (key, value) in pairs {
            catalog.insert(key, value);
        }
        catalog
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = Some(symbol.into());
        self
    }

    /// Defines or replaces one template at runtime.
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.strings.insert(key.into(), template.into());
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl LabelLookup for TextCatalog {
    fn lookup(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }

    fn currency_symbol(&self) -> String {
        self.currency_symbol
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string())
    }
}

/// Expands `%1`..`%9` with positional parameters and `%n`, `%r`, `%t` with
/// control characters. Any other `%x` pair yields `x`.
pub fn expand_template(template: &str, params: &[&str]) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            expanded.push(ch);
            continue;
        }
        match chars.next() {
            Some(digit @ '1'..='9') => {
                let position = digit as usize - '1' as usize;
                expanded.push_str(params.get(position).copied().unwrap_or(MISSING_PARAMETER));
            }
            Some('n') => expanded.push('\n'),
            Some('r') => expanded.push('\r'),
            Some('t') => expanded.push('\t'),
            Some(other) => expanded.push(other),
            // Trailing lone `%` is kept literally.
            None => expanded.push('%'),
        }
    }

    expanded
}
