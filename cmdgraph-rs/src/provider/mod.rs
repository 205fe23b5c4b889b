//! Providers shipped with the engine.
//!
//! [`bind_primitives`] covers the built-in scalar types. Enum parameters use
//! [`ChoiceProvider`] over a `#[derive(Choice)]` enum, and context objects
//! use [`NamespaceProvider`].

mod choice;
mod namespace;
mod primitives;

pub use choice::{normalize, Choice, ChoiceProvider};
pub use namespace::NamespaceProvider;
pub use primitives::{
    bind_primitives, BoolProvider, CharProvider, Number, NumberProvider, PrimitivesModule,
    StringProvider,
};

/// Derives [`Choice`] for a unit-only enum.
pub use cmdgraph_rs_macros::Choice;
