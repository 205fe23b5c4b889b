//! Binding keys.
//!
//! A [`Key`] names a bindable value slot: the Rust type a handler parameter
//! wants, optionally narrowed by a classifier marker type. Two keys are equal
//! iff both the value type and the classifier are equal. There is no subtype
//! or wildcard matching.

use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Marker type narrowing a [`Key`].
///
/// Any `'static` type works as a classifier; zero-sized structs are the
/// usual choice.
///
/// ```
/// use cmdgraph::Key;
///
/// struct Sender;
///
/// let plain = Key::of::<String>();
/// let classified = Key::of::<String>().classified::<Sender>();
/// assert_ne!(plain, classified);
/// ```
#[derive(Clone, Copy)]
pub struct Classifier {
    id: TypeId,
    name: &'static str,
}

impl Classifier {
    /// Classifier for the marker type `C`.
    pub fn of<C: 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: short_name(type_name::<C>()),
        }
    }

    /// Human-readable name of the marker type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Classifier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Classifier {}

impl Hash for Classifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// Identity of a bindable value slot: value type plus optional classifier.
#[derive(Clone, Copy)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    classifier: Option<Classifier>,
}

impl Key {
    /// Unclassified key for values of type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            classifier: None,
        }
    }

    /// Copy of this key narrowed by the classifier `C`.
    ///
    /// The value type is kept as-is.
    pub fn classified<C: 'static>(self) -> Self {
        self.with_classifier(Some(Classifier::of::<C>()))
    }

    /// Copy of this key with the given (or no) classifier.
    pub fn with_classifier(self, classifier: Option<Classifier>) -> Self {
        Self { classifier, ..self }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type name of the value type (diagnostics only).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Value type name without its module path.
    pub fn short_type_name(&self) -> &'static str {
        short_name(self.type_name)
    }

    pub fn classifier(&self) -> Option<Classifier> {
        self.classifier
    }

    /// Whether this key holds values of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.classifier == other.classifier
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.classifier.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.classifier {
            Some(classifier) => write!(f, "Key({} {:?})", self.type_name, classifier),
            None => write!(f, "Key({})", self.type_name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.classifier {
            Some(classifier) => write!(f, "{} {:?}", short_name(self.type_name), classifier),
            None => f.write_str(short_name(self.type_name)),
        }
    }
}

/// Strips the module path from a plain (non-generic) type name.
fn short_name(name: &'static str) -> &'static str {
    if name.contains('<') {
        return name;
    }
    name.rsplit("::").next().unwrap_or(name)
}
