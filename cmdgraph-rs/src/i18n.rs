//! Localization contract.
//!
//! The engine never ships translations itself. Hosts plug a
//! [`ResourceProvider`] into the builder to translate command descriptions,
//! and use [`Messages`] in their own converters to localize error messages.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Source of translated strings.
pub trait ResourceProvider: Send + Sync {
    /// Locale active for the current call.
    fn locale(&self) -> &str;

    /// Translation of `key` in `locale`, if there is one.
    fn get(&self, locale: &str, key: &str) -> Option<String>;

    /// Whether command descriptions and help texts are message keys that
    /// should be translated when commands are compiled.
    fn supports_descriptions(&self) -> bool {
        false
    }
}

/// In-memory bundles keyed by locale, with an optional fallback locale.
#[derive(Debug, Clone, Default)]
pub struct BundleResourceProvider {
    locale: String,
    fallback: Option<String>,
    bundles: HashMap<String, HashMap<String, String>>,
    descriptions: bool,
}

impl BundleResourceProvider {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Self::default()
        }
    }

    /// Locale consulted when the active one has no entry for a key.
    pub fn fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback = Some(locale.into());
        self
    }

    /// Add (or extend) the bundle of `locale`.
    pub fn bundle<K, V>(mut self, locale: &str, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.bundles
            .entry(locale.to_string())
            .or_default()
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a bundle written as `key = value` lines. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn properties(self, locale: &str, source: &str) -> Self {
        self.bundle(locale, parse_properties(source))
    }

    pub fn translate_descriptions(mut self, enabled: bool) -> Self {
        self.descriptions = enabled;
        self
    }
}

impl ResourceProvider for BundleResourceProvider {
    fn locale(&self) -> &str {
        &self.locale
    }

    fn get(&self, locale: &str, key: &str) -> Option<String> {
        let lookup = |locale: &str| self.bundles.get(locale).and_then(|b| b.get(key)).cloned();
        lookup(locale).or_else(|| self.fallback.as_deref().and_then(lookup))
    }

    fn supports_descriptions(&self) -> bool {
        self.descriptions
    }
}

fn parse_properties(source: &str) -> Vec<(String, String)> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Convenience lookups over a [`ResourceProvider`].
#[derive(Clone)]
pub struct Messages {
    provider: Arc<dyn ResourceProvider>,
}

impl Messages {
    pub fn new(provider: impl ResourceProvider + 'static) -> Self {
        Self::shared(Arc::new(provider))
    }

    pub fn shared(provider: Arc<dyn ResourceProvider>) -> Self {
        Self { provider }
    }

    /// Translation of `key`, or `${key}` when none exists.
    pub fn get(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| format!("${{{}}}", key))
    }

    /// Translation of `key` with `{0}`, `{1}`, ... replaced by `args`.
    ///
    /// Without a translation the result is `${key}:[arg, ...]`.
    pub fn format(&self, key: &str, args: &[&dyn Display]) -> String {
        match self.lookup(key) {
            Some(template) => args
                .iter()
                .enumerate()
                .fold(template, |text, (index, arg)| {
                    text.replace(&format!("{{{}}}", index), &arg.to_string())
                }),
            None => {
                let rendered: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
                format!("${{{}}}:[{}]", key, rendered.join(", "))
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let found = self.provider.get(self.provider.locale(), key);
        if found.is_none() {
            tracing::debug!(key, locale = self.provider.locale(), "translation missing");
        }
        found
    }
}

impl fmt::Debug for Messages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messages")
            .field("locale", &self.provider.locale())
            .finish_non_exhaustive()
    }
}
