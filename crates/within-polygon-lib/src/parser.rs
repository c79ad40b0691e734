//! Polygon string parsing
//!
//! Turns a delimited coordinate string (optionally wrapped in a `POLYGON ((...))` envelope)
//! into a closed ring. Vertex tokens that do not split into exactly two numbers are skipped;
//! everything else that goes wrong fails the whole polygon, unless the options ask for
//! errors to be ignored.

use crate::{ParseOptions, ParsedPolygon, Result, SpatialError};
use geo::Coord;

const WKT_KEYWORD: &str = "POLYGON";

/// Parse a polygon description into a validated, closed ring
///
/// Returns `Ok(None)` when the polygon is malformed and `options.ignore_errors` is set; the
/// caller treats that as a predicate that matches nothing.
pub fn parse_polygon(raw: &str, options: &ParseOptions) -> Result<Option<ParsedPolygon>> {
    #[cfg(feature = "profiling")]
    profiling::scope!("parser::parse_polygon");

    options.validate()?;

    let parsed = strip_wkt_envelope(raw)
        .and_then(|body| parse_ring(body, options))
        .and_then(ParsedPolygon::from_ring);

    match parsed {
        Ok(polygon) => Ok(Some(polygon)),
        Err(err) if options.ignore_errors && err.is_polygon_error() => {
            tracing::warn!("Ignoring malformed polygon {raw:?}: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Remove a surrounding `POLYGON ((` ... `))` if present
///
/// The keyword is case-insensitive and may be followed by whitespace before `((`.
fn strip_wkt_envelope(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    let is_wkt = trimmed
        .get(..WKT_KEYWORD.len())
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case(WKT_KEYWORD));
    if !is_wkt {
        return Ok(trimmed);
    }

    trimmed[WKT_KEYWORD.len()..]
        .trim_start()
        .strip_prefix("((")
        .and_then(|body| body.strip_suffix("))"))
        .map(str::trim)
        .ok_or_else(|| SpatialError::MalformedWkt(trimmed.to_string()))
}

/// Tokenise the vertex list and close the ring
fn parse_ring(body: &str, options: &ParseOptions) -> Result<Vec<Coord<f64>>> {
    let mut ring = Vec::new();

    for token in body
        .split(options.point_delimiter.as_str())
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let parts: Vec<&str> = token.split(options.coordinate_delimiter.as_str()).collect();
        let [first, second] = parts.as_slice() else {
            tracing::debug!(
                "Skipping vertex {token:?}: expected 2 coordinates, found {}",
                parts.len()
            );
            continue;
        };

        let first = parse_number(first)?;
        let second = parse_number(second)?;
        ring.push(options.coordinate_order.to_coord(first, second));
    }

    close_ring(&mut ring);
    Ok(ring)
}

fn parse_number(value: &str) -> Result<f64> {
    let value = value.trim();
    value
        .parse::<f64>()
        .map_err(|source| SpatialError::InvalidCoordinate {
            value: value.to_string(),
            source,
        })
}

/// Append the first vertex when the ring is not already closed
fn close_ring(ring: &mut Vec<Coord<f64>>) {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last())
        && first != last
    {
        ring.push(first);
    }
}
