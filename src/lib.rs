//! Resolves a single OpenStreetMap way into its tags and an ordered polyline,
//! either from a local bulk extract (through `osmium`) or from an Overpass
//! query service.

pub mod config;
pub mod data;
pub mod errors;
pub mod geometry;
pub mod osm_xml;
pub mod osmium;
pub mod resolve;

pub use config::ResolverConfig;
pub use data::ResolvedWay;
pub use data::osm::{Coordinate, NodeId, WayId};
pub use errors::{Error, Result};
pub use geometry::Geometry;
pub use resolve::{resolve, LocalExtractor, RemoteResolver, WaySource};
