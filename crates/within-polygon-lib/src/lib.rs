//! Within Polygon Library - Point-in-Polygon Property Function
//!
//! This library implements the `withinPolygon` property function: given a subject resource
//! with an indexed geo point and a polygon description, it answers whether the point lies
//! inside the polygon. Evaluation is split into two phases: a cheap bounding-box lookup
//! against a spatial index, followed by an exact point-in-polygon test on every candidate.
//!
//! # Architecture
//!
//! - **[`parse_polygon`]**: Micro-grammar for delimited coordinate strings and `POLYGON ((...))`
//! - **[`ParsedPolygon`]**: Immutable ring with cached [`BoundingBox`] and exact containment
//! - **[`WithinPolygon`]**: Build phase producing an immutable [`CompiledWithinPolygon`]
//! - **[`PropertyFunctionRegistry`]**: Explicitly injected IRI to factory map
//! - **[`GeoStore`]** / **[`Quadtree`]**: In-memory coordinate store and point index
//!
//! # Query Protocol
//!
//! 1. The polygon is parsed once when the query is built.
//! 2. Its bounding box is handed to [`SpatialIndex::range_query`], which returns a superset
//!    of candidate subjects.
//! 3. Each candidate's latitude and longitude are resolved through [`CoordinateSource`] and
//!    tested exactly. Candidates without both coordinates never match.

mod bbox;
mod host;
mod options;
mod parser;
mod polygon;
mod property_function;
mod quadtree;
mod registry;
mod store;
pub mod vocab;

// Public API exports
pub use bbox::BoundingBox;
pub use host::{Binding, CoordinateSource, ExecutionContext, IndexHit, Node, PropFuncArg, SpatialIndex};
pub use options::{CoordinateOrder, ParseOptions, PolygonArgument};
pub use parser::parse_polygon;
pub use polygon::ParsedPolygon;
pub use property_function::{CompiledPropertyFunction, CompiledWithinPolygon, PropertyFunction, WithinPolygon};
pub use quadtree::Quadtree;
pub use registry::{
    PropertyFunctionFactory, PropertyFunctionRegistry, SPATIAL_FUNCTIONS, register_spatial_functions,
};
pub use store::{Config, GeoStore, StoreInfo};

/// Error types for polygon parsing, query building and point loading
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    #[error("Subject is not a single node: {0}")]
    SubjectNotNode(String),

    #[error("Polygon argument is not a literal: {0}")]
    ObjectNotLiteral(String),

    #[error("Empty argument list")]
    EmptyArgumentList,

    #[error("Empty {0} delimiter")]
    EmptyDelimiter(&'static str),

    #[error("Malformed WKT polygon: {0}")]
    MalformedWkt(String),

    #[error("Invalid coordinate '{value}': {source}")]
    InvalidCoordinate {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("Too few vertices: a ring needs at least 3 distinct points, found {found}")]
    TooFewVertices { found: usize },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Point out of bounds: ({lat}, {lon})")]
    OutOfBounds { lat: f64, lon: f64 },

    #[error("Merge mismatch: {reason}")]
    MergeMismatch { reason: String },

    #[error("Unknown property function: {0}")]
    UnknownFunction(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpatialError {
    /// Whether this error describes a malformed polygon (suppressible with `ignore_errors`)
    pub fn is_polygon_error(&self) -> bool {
        matches!(
            self,
            SpatialError::MalformedWkt(_)
                | SpatialError::InvalidCoordinate { .. }
                | SpatialError::TooFewVertices { .. }
                | SpatialError::InvalidGeometry(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SpatialError>;
