use std::collections::HashMap;

use serde_json::{json, Value};

use crate::geometry::Geometry;
use self::osm::{Coordinate, NodeId, Tags, WayId};

pub mod osm;

/// A way as delivered by one of the resolution strategies, before its node
/// references have been substituted with coordinates.
#[derive(Debug, Clone)]
pub struct RawWay {
    pub id: WayId,
    pub tags: Tags,
    /// In the order the way lists them, duplicates included.
    pub node_refs: Vec<NodeId>,
    /// Lookup only. Never iterate this to build geometry.
    pub coordinates: HashMap<NodeId, Coordinate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWay {
    pub id: WayId,
    pub tags: Tags,
    pub geometry: Geometry,
}

impl ResolvedWay {
    pub fn to_geojson(&self) -> Value {
        let coordinates: Vec<[f64; 2]> = self.geometry
            .points()
            .iter()
            .map(|point| [point.lon, point.lat])
            .collect();

        json!({
            "type": "Feature",
            "id": self.id,
            "properties": self.tags,
            "geometry": {
                "type": "LineString",
                "coordinates": coordinates,
            },
        })
    }
}
