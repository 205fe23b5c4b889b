//! Authorization hooks.
//!
//! Hosts decide what a permission string means. The engine only asks, before
//! touching any argument, whether the invoker described by the [`Namespace`]
//! holds at least one of the permissions a command requires.

use crate::namespace::Namespace;

/// Decides whether a permission is granted.
///
/// Implemented for any `Fn(&Namespace, &str) -> bool`.
///
/// # Example
///
/// ```
/// use cmdgraph::{Authorizer, Namespace};
///
/// struct Admin(bool);
///
/// let authorizer = |namespace: &Namespace, _permission: &str| {
///     namespace.get::<Admin>().map(|admin| admin.0).unwrap_or(false)
/// };
///
/// let mut namespace = Namespace::new();
/// assert!(!authorizer.is_permitted(&namespace, "body.delete"));
/// namespace.insert(Admin(true));
/// assert!(authorizer.is_permitted(&namespace, "body.delete"));
/// ```
pub trait Authorizer: Send + Sync {
    fn is_permitted(&self, namespace: &Namespace, permission: &str) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&Namespace, &str) -> bool + Send + Sync,
{
    fn is_permitted(&self, namespace: &Namespace, permission: &str) -> bool {
        self(namespace, permission)
    }
}

/// Grants every permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuthorizer;

impl Authorizer for NullAuthorizer {
    fn is_permitted(&self, _namespace: &Namespace, _permission: &str) -> bool {
        true
    }
}

/// `true` when `permissions` is empty or any entry is granted.
pub fn any_permitted(
    authorizer: &dyn Authorizer,
    namespace: &Namespace,
    permissions: &[String],
) -> bool {
    permissions.is_empty()
        || permissions
            .iter()
            .any(|permission| authorizer.is_permitted(namespace, permission))
}
