//! IRIs used by the property function and the coordinate store

/// Predicate IRI under which the point-in-polygon property function is registered
pub const WITHIN_POLYGON: &str = "http://www.seco.tkk.fi/spatial#withinPolygon";

/// [W3C Basic Geo](https://www.w3.org/2003/01/geo/) latitude predicate
pub const WGS84_LAT: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#lat";

/// [W3C Basic Geo](https://www.w3.org/2003/01/geo/) longitude predicate
pub const WGS84_LONG: &str = "http://www.w3.org/2003/01/geo/wgs84_pos#long";

pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
