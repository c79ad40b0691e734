//! The `withinPolygon` property function
//!
//! Building turns the subject and object arguments into an immutable
//! [`CompiledWithinPolygon`]; executing it against an [`ExecutionContext`] produces a lazy
//! stream of output bindings. The host can stop pulling at any time.

use crate::{
    Binding, ExecutionContext, Node, ParsedPolygon, PolygonArgument, PropFuncArg, Result,
    SpatialError,
};
use std::fmt;

/// A property function as seen by the host query planner
pub trait PropertyFunction: Send + Sync {
    /// Validate the arguments and compile them into an executable query node
    fn build(
        &self,
        subject: &PropFuncArg,
        predicate: &Node,
        object: &PropFuncArg,
    ) -> Result<Box<dyn CompiledPropertyFunction>>;
}

/// Query-plan node produced by [`PropertyFunction::build`]
pub trait CompiledPropertyFunction: fmt::Debug + Send + Sync {
    /// Evaluate the node for one input binding
    fn execute<'a>(
        &'a self,
        binding: Binding,
        cx: ExecutionContext<'a>,
    ) -> Box<dyn Iterator<Item = Binding> + 'a>;
}

/// Property function matching subjects whose point lies within a polygon
///
/// Subject: a resource with an indexed point (IRI or variable). Object: a polygon string
/// or a list `(polygon point_delimiter? coordinate_delimiter? long_lat? ignore_errors?)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithinPolygon;

impl WithinPolygon {
    pub fn new() -> Self {
        Self
    }

    /// Build phase: parse the polygon once and bundle it with the subject
    ///
    /// `predicate` only appears in the debug log; matching never depends on it.
    pub fn compile(
        &self,
        subject: &PropFuncArg,
        predicate: &Node,
        object: &PropFuncArg,
    ) -> Result<CompiledWithinPolygon> {
        #[cfg(feature = "profiling")]
        profiling::scope!("within_polygon::compile");

        let subject = subject
            .as_node()
            .ok_or_else(|| SpatialError::SubjectNotNode(subject.to_string()))?
            .clone();

        let argument = PolygonArgument::from_object(object)?;
        let polygon = argument.parse()?;

        let compiled = CompiledWithinPolygon { subject, polygon };
        tracing::debug!("Built {predicate} node: {compiled}");
        Ok(compiled)
    }
}

impl PropertyFunction for WithinPolygon {
    fn build(
        &self,
        subject: &PropFuncArg,
        predicate: &Node,
        object: &PropFuncArg,
    ) -> Result<Box<dyn CompiledPropertyFunction>> {
        Ok(Box::new(self.compile(subject, predicate, object)?))
    }
}

/// Immutable result of building `withinPolygon`
///
/// `polygon` is `None` when the polygon was malformed and errors were ignored; such a node
/// never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWithinPolygon {
    subject: Node,
    polygon: Option<ParsedPolygon>,
}

/// What the subject refers to for one input binding
enum SubjectTarget<'a> {
    /// A concrete resource: test that one point
    Bound(String),
    /// A free variable: enumerate index candidates and bind it
    Unbound(&'a str),
    /// Bound to something that cannot carry a point (literal or blank node)
    NotResource,
}

impl CompiledWithinPolygon {
    pub fn subject(&self) -> &Node {
        &self.subject
    }

    pub fn polygon(&self) -> Option<&ParsedPolygon> {
        self.polygon.as_ref()
    }

    fn resolve_subject(&self, binding: &Binding) -> SubjectTarget<'_> {
        match &self.subject {
            Node::Iri(iri) => SubjectTarget::Bound(iri.clone()),
            Node::Variable(name) => match binding.get(name) {
                None => SubjectTarget::Unbound(name),
                Some(Node::Iri(iri)) => SubjectTarget::Bound(iri.clone()),
                Some(_) => SubjectTarget::NotResource,
            },
            Node::Literal { .. } | Node::Blank(_) => SubjectTarget::NotResource,
        }
    }
}

impl CompiledPropertyFunction for CompiledWithinPolygon {
    fn execute<'a>(
        &'a self,
        binding: Binding,
        cx: ExecutionContext<'a>,
    ) -> Box<dyn Iterator<Item = Binding> + 'a> {
        let Some(polygon) = &self.polygon else {
            return Box::new(std::iter::empty());
        };

        match self.resolve_subject(&binding) {
            SubjectTarget::Bound(iri) => {
                let matches = cx
                    .point_of(&iri)
                    .is_some_and(|(lat, lon)| polygon.contains(lat, lon));
                tracing::trace!("Bound subject <{iri}> within polygon: {matches}");
                if matches {
                    Box::new(std::iter::once(binding))
                } else {
                    Box::new(std::iter::empty())
                }
            }
            SubjectTarget::Unbound(variable) => {
                let candidates = cx.index.range_query(&polygon.bounding_box());
                Box::new(candidates.filter_map(move |hit| {
                    let (lat, lon) = cx.point_of(&hit.subject)?;
                    polygon
                        .contains(lat, lon)
                        .then(|| binding.extended(variable, Node::Iri(hit.subject)))
                }))
            }
            SubjectTarget::NotResource => Box::new(std::iter::empty()),
        }
    }
}

impl fmt::Display for CompiledWithinPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.polygon {
            Some(polygon) => {
                let bbox = polygon.bounding_box();
                write!(
                    f,
                    "({} within {} vertices, bbox [{}, {}, {}, {}])",
                    self.subject,
                    polygon.vertex_count(),
                    bbox.min_x,
                    bbox.min_y,
                    bbox.max_x,
                    bbox.max_y
                )
            }
            None => write!(f, "({} within no polygon)", self.subject),
        }
    }
}
