//! Fluent construction of a dispatch tree.
//!
//! Commands are staged first and compiled when the graph is sealed with
//! [`CommandGraph::build`], so every setup problem surfaces in one place.
//!
//! ```
//! use cmdgraph::{provider, BindingRegistry, Command, CommandCallable, CommandGraph, Namespace, Param, ParametricBuilder};
//!
//! let mut registry = BindingRegistry::new();
//! provider::bind_primitives(&mut registry).unwrap();
//!
//! let root = CommandGraph::new(ParametricBuilder::new(registry))
//!     .commands()
//!     .group(["body", "b"])
//!     .describe("Manage celestial bodies")
//!     .register(Command::new(["info"]).handler(
//!         Param::<String>::new("name"),
//!         |_: &mut Namespace, name: String| {
//!             println!("{} is a body", name);
//!             Ok(())
//!         },
//!     ))
//!     .parent()
//!     .graph()
//!     .build()
//!     .unwrap();
//!
//! root.call("body info pluto", &mut Namespace::new(), &[]).unwrap();
//! ```

use std::fmt;

use crate::callable::CommandCallable;
use crate::dispatcher::{AliasCase, CommandMapping, Dispatcher};
use crate::error::SetupError;
use crate::parametric::{CommandDef, ParametricBuilder};

/// A set of commands registered together.
pub trait CommandSet {
    fn commands(&self) -> Vec<CommandDef>;
}

impl CommandSet for Vec<CommandDef> {
    fn commands(&self) -> Vec<CommandDef> {
        self.clone()
    }
}

enum Entry {
    Command(CommandDef),
    Callable {
        aliases: Vec<String>,
        callable: Box<dyn CommandCallable>,
    },
    Group(usize),
}

#[derive(Default)]
struct GroupStage {
    aliases: Vec<String>,
    short: Option<String>,
    help: Option<String>,
    entries: Vec<Entry>,
    default_command: Option<CommandDef>,
}

/// Staged command tree. Groups live in a flat arena; index 0 is the root.
pub struct CommandGraph {
    builder: ParametricBuilder,
    alias_case: AliasCase,
    groups: Vec<GroupStage>,
}

impl CommandGraph {
    pub fn new(builder: ParametricBuilder) -> Self {
        Self {
            builder,
            alias_case: AliasCase::default(),
            groups: vec![GroupStage::default()],
        }
    }

    pub fn alias_case(mut self, alias_case: AliasCase) -> Self {
        self.alias_case = alias_case;
        self
    }

    pub fn builder(&self) -> &ParametricBuilder {
        &self.builder
    }

    /// Start registering at the root group.
    pub fn commands(self) -> DispatcherNode {
        DispatcherNode {
            graph: self,
            current: 0,
            parents: Vec::new(),
        }
    }

    /// Compile every staged command and seal the tree.
    pub fn build(mut self) -> Result<Dispatcher, SetupError> {
        let dispatcher = self.seal(0, "")?;
        tracing::debug!(
            commands = dispatcher.children().len(),
            "command graph built"
        );
        Ok(dispatcher)
    }

    fn seal(&mut self, index: usize, path: &str) -> Result<Dispatcher, SetupError> {
        let stage = std::mem::take(&mut self.groups[index]);
        let display_path = if path.is_empty() { "<root>" } else { path };

        let mut children = Vec::with_capacity(stage.entries.len());
        for entry in stage.entries {
            match entry {
                Entry::Command(def) => {
                    let aliases = def.aliases().to_vec();
                    let callable = self.builder.build(def)?;
                    children.push(CommandMapping::new(aliases, Box::new(callable)));
                }
                Entry::Callable { aliases, callable } => {
                    children.push(CommandMapping::new(aliases, callable));
                }
                Entry::Group(child) => {
                    let aliases = self.groups[child].aliases.clone();
                    let primary = aliases.first().map(String::as_str).unwrap_or_default();
                    let child_path = if path.is_empty() {
                        primary.to_string()
                    } else {
                        format!("{} {}", path, primary)
                    };
                    let dispatcher = self.seal(child, &child_path)?;
                    children.push(CommandMapping::new(aliases, Box::new(dispatcher)));
                }
            }
        }

        let default_command = match stage.default_command {
            Some(def) => Some(Box::new(self.builder.build(def)?) as Box<dyn CommandCallable>),
            None => None,
        };

        Dispatcher::new(
            display_path,
            stage.short.map(|text| self.builder.translate(text)),
            stage.help.map(|text| self.builder.translate(text)),
            self.alias_case,
            children,
            default_command,
        )
    }
}

impl fmt::Debug for CommandGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGraph")
            .field("builder", &self.builder)
            .field("alias_case", &self.alias_case)
            .field("groups", &self.groups.len())
            .finish()
    }
}

/// Cursor over one group of a [`CommandGraph`].
pub struct DispatcherNode {
    graph: CommandGraph,
    current: usize,
    parents: Vec<usize>,
}

impl DispatcherNode {
    fn stage(&mut self) -> &mut GroupStage {
        &mut self.graph.groups[self.current]
    }

    /// Open a new sub-group and move the cursor into it.
    pub fn group<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.graph.groups.len();
        self.graph.groups.push(GroupStage {
            aliases: aliases.into_iter().map(Into::into).collect(),
            ..GroupStage::default()
        });
        self.stage().entries.push(Entry::Group(index));
        self.parents.push(self.current);
        self.current = index;
        self
    }

    /// One-line description of the current group.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.stage().short = Some(text.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.stage().help = Some(text.into());
        self
    }

    pub fn register(mut self, def: CommandDef) -> Self {
        self.stage().entries.push(Entry::Command(def));
        self
    }

    pub fn register_methods(self, set: impl CommandSet) -> Self {
        set.commands()
            .into_iter()
            .fold(self, |node, def| node.register(def))
    }

    /// Register an already built callable, e.g. a hand-written
    /// [`CommandCallable`] or a separately built [`Dispatcher`].
    pub fn register_callable<I, S>(mut self, aliases: I, callable: impl CommandCallable + 'static) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases = aliases.into_iter().map(Into::into).collect();
        self.stage().entries.push(Entry::Callable {
            aliases,
            callable: Box::new(callable),
        });
        self
    }

    /// Command run when the path names no child of the current group.
    pub fn default_command(mut self, def: CommandDef) -> Self {
        self.stage().default_command = Some(def);
        self
    }

    /// Close the current group. On the root this does nothing.
    pub fn parent(mut self) -> Self {
        if let Some(parent) = self.parents.pop() {
            self.current = parent;
        }
        self
    }

    pub fn graph(self) -> CommandGraph {
        self.graph
    }
}

impl fmt::Debug for DispatcherNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherNode")
            .field("current", &self.current)
            .field("depth", &self.parents.len())
            .finish_non_exhaustive()
    }
}
