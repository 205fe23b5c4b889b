//! The model: a shared map of celestial bodies and its providers.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use cmdgraph::error::ParseError;
use cmdgraph::provider::{Choice, ChoiceProvider, NamespaceProvider};
use cmdgraph::{BindingModule, BindingRegistry, CommandArgs, CommandError, Modifiers, Namespace, Provider, SetupError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Choice)]
#[choice(name = "celestial type")]
pub enum CelestialType {
    Planet,
    #[choice(alias = "dwarf")]
    DwarfPlanet,
    Moon,
    Star,
    Asteroid,
}

impl fmt::Display for CelestialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CelestialType::Planet => "planet",
            CelestialType::DwarfPlanet => "dwarf planet",
            CelestialType::Moon => "moon",
            CelestialType::Star => "star",
            CelestialType::Asteroid => "asteroid",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Body {
    pub kind: CelestialType,
    /// Mean surface temperature in Celsius.
    pub temperature: Option<f64>,
    pub description: Option<String>,
}

impl Body {
    pub fn new(kind: CelestialType) -> Self {
        Self {
            kind,
            temperature: None,
            description: None,
        }
    }
}

/// Shared handle to every known body.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    bodies: Arc<Mutex<BTreeMap<String, Body>>>,
}

impl Universe {
    /// The solar system planets, pluto included.
    pub fn solar_system() -> Self {
        let universe = Self::default();
        for name in [
            "mercury", "venus", "earth", "mars", "jupiter", "saturn", "uranus", "neptune", "pluto",
        ] {
            universe.put(name, Body::new(CelestialType::Planet));
        }
        universe
    }

    pub fn put(&self, name: &str, body: Body) {
        self.lock().insert(name.to_string(), body);
    }

    pub fn get(&self, name: &str) -> Option<Body> {
        self.lock().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Body> {
        self.lock().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Apply `update` to the named body.
    pub fn update(&self, name: &str, update: impl FnOnce(&mut Body)) -> Result<(), CommandError> {
        match self.lock().get_mut(name) {
            Some(body) => {
                update(body);
                Ok(())
            }
            None => Err(CommandError::failed(format!("'{}' vanished", name))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Body>> {
        // Updates are single field writes, so a poisoned map is still consistent.
        self.bodies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Name of a body that exists at resolution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyName(pub String);

impl fmt::Display for BodyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct BodyNameProvider {
    universe: Universe,
}

impl Provider<BodyName> for BodyNameProvider {
    fn get(&self, args: &mut CommandArgs<'_>, _: &Modifiers) -> Result<BodyName, CommandError> {
        let name = args.next()?.to_lowercase();
        if self.universe.get(&name).is_some() {
            Ok(BodyName(name))
        } else {
            Err(ParseError::invalid(name.clone(), format!("There is no body named '{}'", name)).into())
        }
    }

    fn suggestions(&self, prefix: &str, _: &Namespace) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.universe
            .names()
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect()
    }
}

struct UniverseProvider {
    universe: Universe,
}

impl Provider<Universe> for UniverseProvider {
    fn is_provided(&self) -> bool {
        true
    }

    fn get(&self, _: &mut CommandArgs<'_>, _: &Modifiers) -> Result<Universe, CommandError> {
        Ok(self.universe.clone())
    }
}

/// The invoking user and what they may do.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub name: String,
    permissions: HashSet<String>,
}

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: HashSet::new(),
        }
    }

    pub fn permit(&mut self, permission: impl Into<String>) {
        self.permissions.insert(permission.into());
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Binds the universe, body names, celestial types and the subject.
pub struct UniverseModule {
    pub universe: Universe,
}

impl BindingModule for UniverseModule {
    fn configure(&self, registry: &mut BindingRegistry) -> Result<(), SetupError> {
        registry
            .bind(UniverseProvider {
                universe: self.universe.clone(),
            })?
            .bind(BodyNameProvider {
                universe: self.universe.clone(),
            })?
            .bind(ChoiceProvider::<CelestialType>::new())?
            .bind(NamespaceProvider::<Subject>::new())?;
        Ok(())
    }
}

/// Permission check against the [`Subject`] in the namespace. No subject
/// means no permissions.
pub fn subject_authorizer(namespace: &Namespace, permission: &str) -> bool {
    namespace
        .get::<Subject>()
        .is_some_and(|subject| subject.has_permission(permission))
}
