use std::{collections::HashMap, fmt};

use crate::data::osm::{Coordinate, NodeId};
use crate::data::{RawWay, ResolvedWay};
use crate::errors::{Error, Result};

/// Ordered polyline of a way. Always holds at least two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    points: Vec<Coordinate>,
}

impl Geometry {
    pub fn new(points: Vec<Coordinate>) -> Result<Geometry> {
        if points.len() < 2 {
            return Err(Error::DegenerateGeometry { node_count: points.len() });
        }
        Ok(Geometry { points })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_closed(&self) -> bool {
        self.points.first() == self.points.last()
    }
}

/// Well-known text, e.g. `LINESTRING (0 0, 1 0, 1 1)`.
impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LINESTRING (")?;
        for (idx, point) in self.points.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", point.lon, point.lat)?;
        }
        write!(f, ")")
    }
}

/// Substitutes every reference with its coordinate, keeping the reference
/// order and any repeated ids. Stops at the first reference without a
/// coordinate.
pub fn assemble(node_refs: &[NodeId], coordinates: &HashMap<NodeId, Coordinate>) -> Result<Geometry> {
    let points = node_refs
        .iter()
        .map(|node_id| {
            coordinates
                .get(node_id)
                .copied()
                .ok_or(Error::MissingNode { node_id: *node_id })
        })
        .collect::<Result<Vec<Coordinate>>>()?;

    Geometry::new(points)
}

pub fn assemble_way(raw: RawWay) -> Result<ResolvedWay> {
    let geometry = assemble(&raw.node_refs, &raw.coordinates)?;
    Ok(ResolvedWay {
        id: raw.id,
        tags: raw.tags,
        geometry,
    })
}
