//! Parameter modifiers.
//!
//! Modifiers are extra declarations attached to a parameter and handed to
//! its provider on every call, e.g. a numeric [`Range`] or a [`Validate`]
//! pattern. The set is open: any `Send + Sync + 'static` value can be used
//! and providers look up the ones they understand by type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

/// Ordered, type-indexed list of modifiers.
#[derive(Clone, Default)]
pub struct Modifiers {
    items: Vec<Arc<dyn Any + Send + Sync>>,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<M: Send + Sync + 'static>(&mut self, modifier: M) {
        self.items.push(Arc::new(modifier));
    }

    /// First modifier of type `M`, if any.
    pub fn get<M: 'static>(&self) -> Option<&M> {
        self.items.iter().find_map(|item| item.downcast_ref::<M>())
    }

    pub fn iter_of<M: 'static>(&self) -> impl Iterator<Item = &M> {
        self.items.iter().filter_map(|item| item.downcast_ref::<M>())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifiers")
            .field("len", &self.items.len())
            .finish()
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(min, f64::INFINITY)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(f64::NEG_INFINITY, max)
    }
}

/// Regular expression a string argument must match in full.
#[derive(Debug, Clone)]
pub struct Validate {
    pattern: String,
    regex: Regex,
}

impl Validate {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}
