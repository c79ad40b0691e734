//! Property-function registry
//!
//! The host owns a registry value and passes it to the query planner; nothing here is
//! process-wide. [`register_spatial_functions`] installs the functions of this crate.

use crate::{PropertyFunction, Result, SpatialError, WithinPolygon, vocab};
use std::collections::HashMap;
use std::fmt;

/// List of property functions registered by [`register_spatial_functions`]
pub const SPATIAL_FUNCTIONS: [&str; 1] = [vocab::WITHIN_POLYGON];

/// Creates a fresh property function for a predicate IRI
pub trait PropertyFunctionFactory: Send + Sync {
    fn create(&self, iri: &str) -> Box<dyn PropertyFunction>;
}

impl<F> PropertyFunctionFactory for F
where
    F: Fn(&str) -> Box<dyn PropertyFunction> + Send + Sync,
{
    fn create(&self, iri: &str) -> Box<dyn PropertyFunction> {
        self(iri)
    }
}

/// Map from predicate IRI to property-function factory
#[derive(Default)]
pub struct PropertyFunctionRegistry {
    factories: HashMap<String, Box<dyn PropertyFunctionFactory>>,
}

impl PropertyFunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the same IRI
    ///
    /// Returns `true` if a factory was replaced.
    pub fn register(
        &mut self,
        iri: impl Into<String>,
        factory: impl PropertyFunctionFactory + 'static,
    ) -> bool {
        let iri = iri.into();
        tracing::debug!("Registering property function <{iri}>");
        self.factories.insert(iri, Box::new(factory)).is_some()
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.factories.contains_key(iri)
    }

    /// Instantiate the property function registered for `iri`
    pub fn create(&self, iri: &str) -> Result<Box<dyn PropertyFunction>> {
        self.factories
            .get(iri)
            .map(|factory| factory.create(iri))
            .ok_or_else(|| SpatialError::UnknownFunction(iri.to_string()))
    }

    /// Registered IRIs (unordered)
    pub fn iris(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for PropertyFunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iris: Vec<&str> = self.iris().collect();
        iris.sort_unstable();
        f.debug_struct("PropertyFunctionRegistry")
            .field("iris", &iris)
            .finish()
    }
}

/// Registers the spatial property functions of this crate
pub fn register_spatial_functions(registry: &mut PropertyFunctionRegistry) {
    registry.register(vocab::WITHIN_POLYGON, |_: &str| -> Box<dyn PropertyFunction> {
        Box::new(WithinPolygon::new())
    });
}
