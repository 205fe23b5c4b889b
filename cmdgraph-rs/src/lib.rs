//! # cmdgraph: typed command graphs
//!
//! A command-processing engine for in-process command lines (chat bots, game
//! consoles, admin shells). Hosts register commands with typed parameters in
//! a tree of groups, and the engine turns `"body settemp mercury 167"` into a
//! call of the right handler with the right values.
//!
//! ## Core Principles
//!
//! - **Type-driven injection**: parameters are filled by providers looked up
//!   by [`Key`] (value type plus optional classifier)
//! - **Checked at setup**: unresolved parameters, bad layouts and alias
//!   clashes are [`SetupError`]s before the first dispatch
//! - **Failures are data**: every invocation failure is a [`CommandError`],
//!   and exception converters turn raw parse failures into user messages
//!
//! ## Quick Start
//!
//! ```
//! use cmdgraph::{
//!     provider, BindingRegistry, Command, CommandCallable, CommandGraph, Namespace, Param,
//!     ParametricBuilder,
//! };
//!
//! let mut registry = BindingRegistry::new();
//! provider::bind_primitives(&mut registry)?;
//!
//! let root = CommandGraph::new(ParametricBuilder::new(registry))
//!     .commands()
//!     .group(["body"])
//!     .register(Command::new(["settemp"]).desc("Set the temperature").handler(
//!         (Param::<String>::new("name"), Param::<f64>::new("temp")),
//!         |_: &mut Namespace, (name, temp): (String, f64)| {
//!             println!("{} is now {} degrees", name, temp);
//!             Ok(())
//!         },
//!     ))
//!     .graph()
//!     .build()?;
//!
//! root.call("body settemp mercury 167", &mut Namespace::new(), &[])?;
//!
//! let err = root.call("body settemp mercury", &mut Namespace::new(), &[]).unwrap_err();
//! assert_eq!(err.to_string(), "Too few arguments! No value found for parameter 'temp'");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Lets generated code refer to `::cmdgraph` from inside this crate too.
extern crate self as cmdgraph;

pub mod argument;
pub mod auth;
pub mod binding;
pub mod callable;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod fluent;
pub mod i18n;
pub mod key;
pub mod kind;
pub mod modifier;
pub mod namespace;
pub mod parametric;
pub mod provider;

#[cfg(feature = "subscriber")]
pub mod tracing_support;

pub use argument::CommandArgs;
pub use auth::{Authorizer, NullAuthorizer};
pub use binding::{provider_fn, Binding, BindingModule, BindingRegistry, Provider};
pub use callable::{CommandCallable, CommandSummary, Description};
pub use convert::{DefaultExceptionConverter, ExceptionContext, ExceptionConverter, HandlerTable};
pub use dispatcher::{AliasCase, Dispatcher};
pub use error::{CommandError, SetupError};
pub use fluent::{CommandGraph, CommandSet, DispatcherNode};
pub use i18n::{BundleResourceProvider, Messages, ResourceProvider};
pub use key::{Classifier, Key};
pub use kind::{Catch, FailureKind};
pub use modifier::{Modifiers, Range, Validate};
pub use namespace::{CancelFlag, Namespace};
pub use parametric::{Command, CommandDef, Param, ParametricBuilder, ParametricCallable};

#[cfg(feature = "subscriber")]
pub use tracing_support::{init_subscriber, init_subscriber_with_config, TracingConfig, TracingFormat};
