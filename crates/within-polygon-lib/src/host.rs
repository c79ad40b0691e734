//! Minimal host query-engine model and the seams the property function plugs into
//!
//! The host engine owns query planning, variable bindings, the spatial index and the
//! triple store. This module only models what the property function needs from them:
//! terms and argument shapes, solution bindings, a bounding-box range query and a
//! numeric property lookup.

use crate::{BoundingBox, vocab};
use geo::Point;
use std::collections::HashMap;
use std::fmt;

/// A term in a query pattern or a solution
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    Iri(String),
    Literal {
        lexical: String,
        datatype: Option<String>,
    },
    Variable(String),
    Blank(String),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    /// Plain (untyped) literal
    pub fn literal(lexical: impl Into<String>) -> Self {
        Node::Literal {
            lexical: lexical.into(),
            datatype: None,
        }
    }

    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal {
            lexical: lexical.into(),
            datatype: Some(datatype.into()),
        }
    }

    /// `xsd:boolean` literal
    pub fn boolean(value: bool) -> Self {
        Node::typed_literal(value.to_string(), vocab::XSD_BOOLEAN)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Node::Variable(name.into())
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Node::Variable(_))
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }

    /// Lexical form if this node is a literal
    pub fn literal_lexical_form(&self) -> Option<&str> {
        match self {
            Node::Literal { lexical, .. } => Some(lexical),
            _ => None,
        }
    }

    /// Datatype IRI if this node is a typed literal
    pub fn literal_datatype(&self) -> Option<&str> {
        match self {
            Node::Literal { datatype, .. } => datatype.as_deref(),
            _ => None,
        }
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{iri}>"),
            Node::Literal {
                lexical,
                datatype: None,
            } => write!(f, "{lexical:?}"),
            Node::Literal {
                lexical,
                datatype: Some(datatype),
            } => write!(f, "{lexical:?}^^<{datatype}>"),
            Node::Variable(name) => write!(f, "?{name}"),
            Node::Blank(label) => write!(f, "_:{label}"),
        }
    }
}

/// Argument of a property function: either a single node or a list `(a b c)`
#[derive(Debug, Clone, PartialEq)]
pub enum PropFuncArg {
    Node(Node),
    List(Vec<Node>),
}

impl PropFuncArg {
    #[inline]
    pub fn is_node(&self) -> bool {
        matches!(self, PropFuncArg::Node(_))
    }

    /// The single node, `None` for a list argument
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            PropFuncArg::Node(node) => Some(node),
            PropFuncArg::List(_) => None,
        }
    }
}

impl From<Node> for PropFuncArg {
    fn from(node: Node) -> Self {
        PropFuncArg::Node(node)
    }
}

impl fmt::Display for PropFuncArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropFuncArg::Node(node) => write!(f, "{node}"),
            PropFuncArg::List(nodes) => {
                write!(f, "(")?;
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{node}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A solution: variable name to bound value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    values: HashMap<String, Node>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable: &str) -> Option<&Node> {
        self.values.get(variable)
    }

    pub fn insert(&mut self, variable: impl Into<String>, value: Node) -> Option<Node> {
        self.values.insert(variable.into(), value)
    }

    /// Copy of this binding with one more variable bound
    pub fn extended(&self, variable: &str, value: Node) -> Self {
        let mut binding = self.clone();
        binding.insert(variable, value);
        binding
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A candidate returned by a bounding-box range query
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    /// Subject IRI
    pub subject: String,
    /// Indexed point (`x` = longitude, `y` = latitude)
    pub point: Point<f64>,
}

/// Spatial index that can answer bounding-box range queries cheaply
///
/// Implementations may return false positives but must not miss any subject whose
/// indexed point lies inside (or on the edge of) the box.
pub trait SpatialIndex {
    fn range_query<'a>(&'a self, bbox: &BoundingBox) -> Box<dyn Iterator<Item = IndexHit> + 'a>;
}

/// Read access to numeric properties of subjects in the active graph
pub trait CoordinateSource {
    fn coordinate(&self, subject: &str, predicate: &str) -> Option<f64>;
}

/// Everything the execute phase borrows from the host
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub index: &'a dyn SpatialIndex,
    pub source: &'a dyn CoordinateSource,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(index: &'a dyn SpatialIndex, source: &'a dyn CoordinateSource) -> Self {
        Self { index, source }
    }

    /// Resolve `(latitude, longitude)` of a subject, `None` if either is missing
    pub fn point_of(&self, subject: &str) -> Option<(f64, f64)> {
        let lat = self.source.coordinate(subject, vocab::WGS84_LAT)?;
        let lon = self.source.coordinate(subject, vocab::WGS84_LONG)?;
        Some((lat, lon))
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext").finish_non_exhaustive()
    }
}
