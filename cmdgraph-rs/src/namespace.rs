//! Per-invocation context.
//!
//! A [`Namespace`] carries the ambient values a command needs but the user
//! does not type, such as "who is invoking". The host fills it before
//! dispatch. Providers read it and handlers may write derived state back.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{CommandError, Interrupted};

/// Type-keyed map of request-scoped values.
///
/// # Example
///
/// ```
/// use cmdgraph::Namespace;
///
/// struct Subject(&'static str);
///
/// let mut namespace = Namespace::new();
/// namespace.insert(Subject("example_user"));
///
/// assert_eq!(namespace.get::<Subject>().map(|s| s.0), Some("example_user"));
/// ```
#[derive(Default)]
pub struct Namespace {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning the previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|value| value.downcast_mut::<T>())
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|value| value.downcast::<T>().ok())
            .map(|value| *value)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fails with [`CommandError::Interrupted`] if a [`CancelFlag`] in this
    /// namespace has been raised.
    pub fn check_cancelled(&self) -> Result<(), CommandError> {
        match self.get::<CancelFlag>() {
            Some(flag) => flag.check(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("len", &self.values.len())
            .finish_non_exhaustive()
    }
}

/// Cooperative cancellation signal shared between a host and a running
/// handler.
///
/// The host keeps one clone and puts another into the [`Namespace`].
/// Long-running handlers poll [`CancelFlag::check`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Interrupted)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<(), CommandError> {
        if self.is_cancelled() {
            Err(CommandError::Interrupted(Interrupted))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Subject(String);

    #[test]
    fn test_insert_get_remove() {
        let mut namespace = Namespace::new();
        assert!(namespace.is_empty());

        assert!(namespace.insert(Subject("alice".into())).is_none());
        assert_eq!(
            namespace.insert(Subject("bob".into())),
            Some(Subject("alice".into()))
        );
        assert_eq!(namespace.get::<Subject>(), Some(&Subject("bob".into())));
        assert_eq!(namespace.len(), 1);

        namespace.get_mut::<Subject>().unwrap().0.push('!');
        assert_eq!(namespace.remove::<Subject>(), Some(Subject("bob!".into())));
        assert!(!namespace.contains::<Subject>());
    }

    #[test]
    fn test_values_are_keyed_by_type() {
        let mut namespace = Namespace::new();
        namespace.insert(1u32);
        namespace.insert(2u64);
        assert_eq!(namespace.get::<u32>(), Some(&1));
        assert_eq!(namespace.get::<u64>(), Some(&2));
        assert_eq!(namespace.get::<i32>(), None);
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        let mut namespace = Namespace::new();
        namespace.insert(flag.clone());

        assert!(namespace.check_cancelled().is_ok());
        flag.cancel();
        assert!(matches!(
            namespace.check_cancelled(),
            Err(CommandError::Interrupted(_))
        ));
    }
}
