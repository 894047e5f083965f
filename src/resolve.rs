pub mod local;
pub mod remote;

use std::path::Path;
use log::{info, error};

use crate::config::ResolverConfig;
use crate::data::{RawWay, ResolvedWay};
use crate::data::osm::WayId;
use crate::errors::{Error, Result};
use crate::geometry;

pub use local::LocalExtractor;
pub use remote::RemoteResolver;

/// A way to obtain a way's tags, node references and node coordinates.
pub trait WaySource {
    fn source_name(&self) -> &'static str;

    fn extract(&mut self, way_id: WayId) -> Result<RawWay>;

    fn transform(&mut self, raw: RawWay) -> Result<ResolvedWay> {
        geometry::assemble_way(raw)
    }

    fn resolve(&mut self, way_id: WayId) -> Result<ResolvedWay> {
        let source = self.source_name();
        info!(source = source, way_id = way_id.get(); "Resolving way");

        let raw = match self.extract(way_id) {
            Ok(raw) => Ok(raw),
            Err(err) => {
                let message = err.to_string();
                error!(source = source, way_id = way_id.get(), err = message.as_str(); "Extraction failed with error");
                Err(err)
            },
        }?;

        info!(source = source, way_id = way_id.get(), node_refs = raw.node_refs.len(); "Assembling geometry");
        let way = match self.transform(raw) {
            Ok(way) => Ok(way),
            Err(err) => {
                let message = err.to_string();
                error!(source = source, way_id = way_id.get(), err = message.as_str(); "Assembly failed with error");
                Err(err)
            },
        }?;

        info!(
            source = source,
            way_id = way_id.get(),
            points = way.geometry.len(),
            closed = way.geometry.is_closed();
            "Way resolved"
        );
        Ok(way)
    }
}

/// Resolves a way from a bulk file when one is given, otherwise from the
/// remote query service.
pub fn resolve(way_id: Option<WayId>, bulk_path: Option<&Path>, config: &ResolverConfig) -> Result<ResolvedWay> {
    let way_id = way_id.ok_or_else(|| Error::InvalidArgument("Way id may not be empty".to_string()))?;

    let mut source: Box<dyn WaySource> = match bulk_path {
        Some(path) => Box::new(LocalExtractor::new(path, config)),
        None => Box::new(RemoteResolver::new(config)),
    };
    source.resolve(way_id)
}
