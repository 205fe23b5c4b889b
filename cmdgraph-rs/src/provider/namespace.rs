//! Values taken from the invocation's namespace.

use std::any::type_name;
use std::marker::PhantomData;

use crate::argument::CommandArgs;
use crate::binding::Provider;
use crate::error::{CommandError, ProvisionError};
use crate::modifier::Modifiers;

/// Clones a `T` out of the namespace. Consumes no tokens.
///
/// Typical use is the acting user or session object the host inserts
/// before dispatching.
#[derive(Debug)]
pub struct NamespaceProvider<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> NamespaceProvider<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for NamespaceProvider<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> Provider<T> for NamespaceProvider<T> {
    fn is_provided(&self) -> bool {
        true
    }

    fn get(&self, args: &mut CommandArgs<'_>, _: &Modifiers) -> Result<T, CommandError> {
        args.namespace().get::<T>().cloned().ok_or_else(|| {
            ProvisionError::new(format!(
                "No {} is available in the namespace",
                type_name::<T>().rsplit("::").next().unwrap_or_default()
            ))
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::Namespace;

    #[derive(Debug, Clone, PartialEq)]
    struct Session {
        user: String,
    }

    #[test]
    fn test_reads_without_consuming() {
        let mut namespace = Namespace::new();
        namespace.insert(Session {
            user: "ada".into(),
        });
        let mut args = CommandArgs::new(vec!["pluto".into()], &namespace);

        let provider = NamespaceProvider::<Session>::new();
        assert!(provider.is_provided());
        let session = provider.get(&mut args, &Modifiers::new()).unwrap();
        assert_eq!(session.user, "ada");
        assert_eq!(args.remaining(), ["pluto"]);
    }

    #[test]
    fn test_absent_value() {
        let namespace = Namespace::new();
        let mut args = CommandArgs::new(Vec::new(), &namespace);
        let err = NamespaceProvider::<Session>::new()
            .get(&mut args, &Modifiers::new())
            .unwrap_err();
        match err {
            CommandError::Provision(e) => {
                assert_eq!(e.message, "No Session is available in the namespace")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
