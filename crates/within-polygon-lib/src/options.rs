//! Parse options and the object-argument shapes of `withinPolygon`
//!
//! The object of the property function is either a bare polygon literal or a list
//!
//! ```text
//! ("polygon" ["point_delimiter"] ["coordinate_delimiter"] [long_lat] [ignore_errors])
//! ```
//!
//! Examples:
//! - Simple: `"59.92 24.94, 59.94 25.15, 60.02 25.16"`
//! - WKT: `"POLYGON ((59.92 24.94, 59.94 25.15, 60.02 25.16))"`
//! - Long-lat with custom delimiters:
//!   `("24.94,59.92 25.15,59.94 25.16,60.02" " " "," true)`

use crate::{Node, ParsedPolygon, PropFuncArg, Result, SpatialError, parse_polygon, vocab};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Order in which the two numbers of a vertex are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CoordinateOrder {
    /// Latitude first, then longitude
    #[default]
    LatLong,
    /// Longitude first, then latitude
    LongLat,
}

impl CoordinateOrder {
    /// Arrange the two written numbers as `(latitude, longitude)`
    #[inline]
    pub fn to_lat_lon(self, first: f64, second: f64) -> (f64, f64) {
        match self {
            CoordinateOrder::LatLong => (first, second),
            CoordinateOrder::LongLat => (second, first),
        }
    }

    /// Arrange the two written numbers as a coordinate (`x` = longitude, `y` = latitude)
    #[inline]
    pub fn to_coord(self, first: f64, second: f64) -> Coord<f64> {
        let (lat, lon) = self.to_lat_lon(first, second);
        Coord { x: lon, y: lat }
    }

    /// Inverse of [`CoordinateOrder::to_lat_lon`]: the pair in written order
    #[inline]
    pub fn written(self, lat: f64, lon: f64) -> (f64, f64) {
        match self {
            CoordinateOrder::LatLong => (lat, lon),
            CoordinateOrder::LongLat => (lon, lat),
        }
    }
}

/// Options controlling how a polygon string is tokenised
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParseOptions {
    /// Separator between vertices (default `", "`)
    pub point_delimiter: String,
    /// Separator between the two numbers of a vertex (default `" "`)
    pub coordinate_delimiter: String,
    /// Order of the two numbers of a vertex (default latitude first)
    pub coordinate_order: CoordinateOrder,
    /// Turn malformed polygons into "matches nothing" instead of an error
    pub ignore_errors: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            point_delimiter: ", ".to_string(),
            coordinate_delimiter: " ".to_string(),
            coordinate_order: CoordinateOrder::LatLong,
            ignore_errors: false,
        }
    }
}

impl ParseOptions {
    pub fn with_point_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.point_delimiter = delimiter.into();
        self
    }

    pub fn with_coordinate_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.coordinate_delimiter = delimiter.into();
        self
    }

    pub fn with_coordinate_order(mut self, order: CoordinateOrder) -> Self {
        self.coordinate_order = order;
        self
    }

    pub fn with_ignore_errors(mut self, ignore_errors: bool) -> Self {
        self.ignore_errors = ignore_errors;
        self
    }

    /// Reject option combinations that cannot tokenise anything
    pub fn validate(&self) -> Result<()> {
        if self.point_delimiter.is_empty() {
            return Err(SpatialError::EmptyDelimiter("point"));
        }
        if self.coordinate_delimiter.is_empty() {
            return Err(SpatialError::EmptyDelimiter("coordinate"));
        }
        Ok(())
    }
}

/// Object argument of `withinPolygon`, resolved once at build time
#[derive(Debug, Clone, PartialEq)]
pub enum PolygonArgument {
    /// Polygon string parsed with default options
    Bare(String),
    /// Polygon string with explicit options
    WithOptions(String, ParseOptions),
}

impl PolygonArgument {
    /// Resolve the object argument of the property function
    pub fn from_object(object: &PropFuncArg) -> Result<Self> {
        let args = match object {
            PropFuncArg::Node(node) => return Ok(PolygonArgument::Bare(literal_text(node)?)),
            PropFuncArg::List(args) => args,
        };

        let (polygon, params) = args.split_first().ok_or(SpatialError::EmptyArgumentList)?;
        let polygon = literal_text(polygon)?;
        if params.is_empty() {
            return Ok(PolygonArgument::Bare(polygon));
        }

        let mut options = ParseOptions::default();
        let mut params = params.iter();
        if let Some(node) = params.next() {
            options.point_delimiter = literal_text(node)?;
        }
        if let Some(node) = params.next() {
            options.coordinate_delimiter = literal_text(node)?;
        }
        if let Some(node) = params.next()
            && flag_value(node)
        {
            options.coordinate_order = CoordinateOrder::LongLat;
        }
        if let Some(node) = params.next() {
            options.ignore_errors = flag_value(node);
        }
        let extra = params.count();
        if extra > 0 {
            tracing::debug!("Ignoring {extra} extra withinPolygon argument(s) in {object}");
        }

        Ok(PolygonArgument::WithOptions(polygon, options))
    }

    pub fn polygon_text(&self) -> &str {
        match self {
            PolygonArgument::Bare(text) | PolygonArgument::WithOptions(text, _) => text,
        }
    }

    /// Parse the polygon with the options this argument carries
    pub fn parse(&self) -> Result<Option<ParsedPolygon>> {
        match self {
            PolygonArgument::Bare(text) => parse_polygon(text, &ParseOptions::default()),
            PolygonArgument::WithOptions(text, options) => parse_polygon(text, options),
        }
    }
}

fn literal_text(node: &Node) -> Result<String> {
    node.literal_lexical_form()
        .map(str::to_string)
        .ok_or_else(|| SpatialError::ObjectNotLiteral(node.to_string()))
}

/// Flags are true only for a boolean-compatible literal spelled `true` or `1`
fn flag_value(node: &Node) -> bool {
    let Some(lexical) = node.literal_lexical_form() else {
        return false;
    };
    let boolean_compatible = matches!(
        node.literal_datatype(),
        None | Some(vocab::XSD_BOOLEAN) | Some(vocab::XSD_STRING)
    );
    boolean_compatible && matches!(lexical.trim(), "true" | "1")
}
