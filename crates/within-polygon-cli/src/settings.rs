use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Within Polygon - Find GPX points that lie inside a polygon
pub struct Settings {
    /// Polygon as delimited coordinates ("lat lon, lat lon, ...") or WKT "POLYGON ((...))"
    #[clap(value_name = "POLYGON")]
    pub polygon: String,

    /// GPX files whose waypoints, route points and track points are searched
    #[clap(short, long = "gpx-file", value_name = "FILE")]
    pub gpx_files: Vec<PathBuf>,

    /// Only test this subject IRI instead of searching the index
    #[clap(short, long, value_name = "IRI")]
    pub subject: Option<String>,

    /// Separator between points of the polygon
    #[clap(long, default_value = ", ")]
    pub point_delimiter: String,

    /// Separator between the two coordinates of a point
    #[clap(long, default_value = " ")]
    pub coordinate_delimiter: String,

    /// Points are written longitude first
    #[clap(long)]
    pub long_lat: bool,

    /// Treat an unparsable polygon as matching nothing instead of failing
    #[clap(long)]
    pub ignore_errors: bool,

    /// Prefix for the subject IRIs minted for loaded GPX points
    #[clap(long, default_value = "urn:gpx:")]
    pub base_iri: String,

    /// Maximum points per quadtree node before subdivision
    #[clap(long, default_value = "64")]
    pub max_points_per_node: usize,

    /// Maximum quadtree depth
    #[clap(long, default_value = "20")]
    pub max_depth: u32,
}
