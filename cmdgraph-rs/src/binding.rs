//! Providers and the binding registry.
//!
//! A [`Provider`] knows how to produce one type of value, from user tokens
//! or from the [`Namespace`]. The [`BindingRegistry`] maps each [`Key`] to
//! exactly one provider. Handler parameters are resolved against it when a
//! command is compiled, never at call time.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::argument::CommandArgs;
use crate::error::{CommandError, SetupError};
use crate::key::Key;
use crate::modifier::Modifiers;
use crate::namespace::Namespace;

/// Type-erased parameter value.
pub(crate) type AnyValue = Box<dyn Any + Send>;

/// Produces values of type `T` for handler parameters.
///
/// # Example
///
/// ```
/// use cmdgraph::{CommandArgs, CommandError, Modifiers, Provider};
///
/// struct Upper;
///
/// impl Provider<String> for Upper {
///     fn get(&self, args: &mut CommandArgs<'_>, _: &Modifiers) -> Result<String, CommandError> {
///         Ok(args.next()?.to_uppercase())
///     }
/// }
/// ```
pub trait Provider<T>: Send + Sync {
    /// `true` if the value never comes from user text (e.g. it is read from
    /// the namespace). Such parameters consume no tokens and are left out of
    /// usage strings.
    fn is_provided(&self) -> bool {
        false
    }

    /// Produce a value, consuming tokens from `args` as needed.
    fn get(&self, args: &mut CommandArgs<'_>, modifiers: &Modifiers) -> Result<T, CommandError>;

    /// Completion hints for a partially typed token. Advisory only.
    fn suggestions(&self, prefix: &str, namespace: &Namespace) -> Vec<String> {
        let _ = (prefix, namespace);
        Vec::new()
    }
}

/// Provider backed by a closure.
pub struct FnProvider<T, F> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

/// Wrap a closure as a [`Provider`].
pub fn provider_fn<T, F>(f: F) -> FnProvider<T, F>
where
    F: Fn(&mut CommandArgs<'_>, &Modifiers) -> Result<T, CommandError> + Send + Sync,
{
    FnProvider {
        f,
        _marker: PhantomData,
    }
}

impl<T, F> Provider<T> for FnProvider<T, F>
where
    F: Fn(&mut CommandArgs<'_>, &Modifiers) -> Result<T, CommandError> + Send + Sync,
{
    fn get(&self, args: &mut CommandArgs<'_>, modifiers: &Modifiers) -> Result<T, CommandError> {
        (self.f)(args, modifiers)
    }
}

// ============================================================================
// Erasure
// ============================================================================

trait ErasedProvider: Send + Sync {
    fn is_provided(&self) -> bool;

    fn provide(
        &self,
        args: &mut CommandArgs<'_>,
        modifiers: &Modifiers,
    ) -> Result<AnyValue, CommandError>;

    fn suggestions(&self, prefix: &str, namespace: &Namespace) -> Vec<String>;

    fn provider_name(&self) -> &'static str;
}

struct Typed<T, P> {
    provider: P,
    _marker: PhantomData<fn() -> T>,
}

impl<T, P> ErasedProvider for Typed<T, P>
where
    T: Send + 'static,
    P: Provider<T>,
{
    fn is_provided(&self) -> bool {
        self.provider.is_provided()
    }

    fn provide(
        &self,
        args: &mut CommandArgs<'_>,
        modifiers: &Modifiers,
    ) -> Result<AnyValue, CommandError> {
        self.provider
            .get(args, modifiers)
            .map(|value| Box::new(value) as AnyValue)
    }

    fn suggestions(&self, prefix: &str, namespace: &Namespace) -> Vec<String> {
        self.provider.suggestions(prefix, namespace)
    }

    fn provider_name(&self) -> &'static str {
        type_name::<P>()
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// Immutable association of a [`Key`] with its provider.
#[derive(Clone)]
pub struct Binding {
    key: Key,
    provider: Arc<dyn ErasedProvider>,
}

impl Binding {
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn is_provided(&self) -> bool {
        self.provider.is_provided()
    }

    pub fn suggestions(&self, prefix: &str, namespace: &Namespace) -> Vec<String> {
        self.provider.suggestions(prefix, namespace)
    }

    pub(crate) fn provide(
        &self,
        args: &mut CommandArgs<'_>,
        modifiers: &Modifiers,
    ) -> Result<AnyValue, CommandError> {
        self.provider.provide(args, modifiers)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

/// A reusable group of bindings, installed with
/// [`BindingRegistry::install`].
pub trait BindingModule {
    fn configure(&self, registry: &mut BindingRegistry) -> Result<(), SetupError>;
}

/// Exact-match table from [`Key`] to [`Binding`].
///
/// Populated once during setup, then shared read-only.
#[derive(Clone, Default)]
pub struct BindingRegistry {
    bindings: HashMap<Key, Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `provider` under the unclassified key of `T`.
    pub fn bind<T, P>(&mut self, provider: P) -> Result<&mut Self, SetupError>
    where
        T: Send + 'static,
        P: Provider<T> + 'static,
    {
        self.register(Key::of::<T>(), provider)
    }

    /// Bind `provider` under the key of `T` classified by `C`.
    pub fn bind_classified<T, C, P>(&mut self, provider: P) -> Result<&mut Self, SetupError>
    where
        T: Send + 'static,
        C: 'static,
        P: Provider<T> + 'static,
    {
        self.register(Key::of::<T>().classified::<C>(), provider)
    }

    /// Bind `provider` under an explicit key, whose value type must be `T`.
    pub fn register<T, P>(&mut self, key: Key, provider: P) -> Result<&mut Self, SetupError>
    where
        T: Send + 'static,
        P: Provider<T> + 'static,
    {
        if !key.is::<T>() {
            return Err(SetupError::KeyTypeMismatch {
                key: key.to_string(),
                provided: type_name::<T>().to_string(),
            });
        }
        if self.bindings.contains_key(&key) {
            return Err(SetupError::DuplicateBinding {
                key: key.to_string(),
            });
        }

        tracing::debug!(key = %key, provider = type_name::<P>(), "binding registered");
        let binding = Binding {
            key,
            provider: Arc::new(Typed {
                provider,
                _marker: PhantomData,
            }),
        };
        self.bindings.insert(key, binding);
        Ok(self)
    }

    /// Run a module's bindings against this registry.
    pub fn install(&mut self, module: impl BindingModule) -> Result<&mut Self, SetupError> {
        module.configure(self)?;
        Ok(self)
    }

    /// Exact lookup. No supertype, subtype or classifier fallback.
    pub fn lookup(&self, key: &Key) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.bindings.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sender;

    struct Fixed(&'static str);

    impl Provider<String> for Fixed {
        fn get(&self, _: &mut CommandArgs<'_>, _: &Modifiers) -> Result<String, CommandError> {
            Ok(self.0.to_string())
        }
    }

    fn provide_string(binding: &Binding) -> String {
        let namespace = Namespace::new();
        let mut args = CommandArgs::new(Vec::new(), &namespace);
        let value = binding.provide(&mut args, &Modifiers::new()).unwrap();
        *value.downcast::<String>().unwrap()
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut registry = BindingRegistry::new();
        registry
            .bind(Fixed("plain"))
            .unwrap()
            .bind_classified::<String, Sender, _>(Fixed("sender"))
            .unwrap();

        let plain = registry.lookup(&Key::of::<String>()).unwrap();
        let sender = registry
            .lookup(&Key::of::<String>().classified::<Sender>())
            .unwrap();
        assert_eq!(provide_string(plain), "plain");
        assert_eq!(provide_string(sender), "sender");
        assert!(registry.lookup(&Key::of::<&'static str>()).is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_binding_fails() {
        let mut registry = BindingRegistry::new();
        registry.bind(Fixed("first")).unwrap();
        let err = registry.bind(Fixed("second")).unwrap_err();
        assert!(matches!(err, SetupError::DuplicateBinding { .. }));

        let still = registry.lookup(&Key::of::<String>()).unwrap();
        assert_eq!(provide_string(still), "first");
    }

    #[test]
    fn test_register_checks_key_type() {
        let mut registry = BindingRegistry::new();
        let err = registry
            .register::<String, _>(Key::of::<u32>(), Fixed("x"))
            .unwrap_err();
        assert!(matches!(err, SetupError::KeyTypeMismatch { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_closure_provider() {
        let mut registry = BindingRegistry::new();
        registry
            .bind(provider_fn(|args: &mut CommandArgs<'_>, _: &Modifiers| {
                Ok(args.next()?.len())
            }))
            .unwrap();

        let namespace = Namespace::new();
        let mut args = CommandArgs::new(vec!["mercury".to_string()], &namespace);
        let binding = registry.lookup(&Key::of::<usize>()).unwrap();
        let value = binding.provide(&mut args, &Modifiers::new()).unwrap();
        assert_eq!(*value.downcast::<usize>().unwrap(), 7);
        assert!(!binding.is_provided());
    }
}
