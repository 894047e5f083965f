use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use log::info;
use tempfile::TempDir;

use crate::config::ResolverConfig;
use crate::data::RawWay;
use crate::data::osm::{NodeId, WayId};
use crate::errors::{Error, Result};
use crate::osm_xml;
use crate::osmium::{self, Invocation, OsmTool, Osmium, Stage};

use super::WaySource;

pub const SOURCE_NAME: &str = "local";

const WAY_FILE_NAME: &str = "way.osm";
const NODES_FILE_NAME: &str = "nodes.osm";
const MERGED_FILE_NAME: &str = "merged.osm";
const LOCATED_FILE_NAME: &str = "located.osm";

/// Resolves ways from a bulk map-data file by running the extraction tool in
/// four stages. Every resolution gets its own scratch directory, removed when
/// the resolution ends however it ends.
pub struct LocalExtractor<T: OsmTool = Osmium> {
    bulk_path: PathBuf,
    tool: T,
    temp_root: Option<PathBuf>,
}

impl LocalExtractor<Osmium> {
    pub fn new(bulk_path: &Path, config: &ResolverConfig) -> LocalExtractor<Osmium> {
        LocalExtractor::with_tool(bulk_path, Osmium::new(&config.osmium_path), config.temp_dir.clone())
    }
}

impl<T: OsmTool> LocalExtractor<T> {
    pub fn with_tool(bulk_path: &Path, tool: T, temp_root: Option<PathBuf>) -> LocalExtractor<T> {
        LocalExtractor {
            bulk_path: bulk_path.to_path_buf(),
            tool,
            temp_root,
        }
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("follow-lane-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn run_stage(&mut self, invocation: Invocation, way_id: WayId) -> Result<PathBuf> {
        info!(stage = invocation.stage.name(), way_id = way_id.get(); "Running stage");
        self.tool.run(&invocation)?;
        Ok(invocation.output)
    }

    fn extract_way(&mut self, dir: &Path, way_id: WayId) -> Result<PathBuf> {
        let invocation = Invocation::new(
            Stage::ExtractWay,
            vec![self.bulk_path.clone().into_os_string(), format!("w{}", way_id).into()],
            dir.join(WAY_FILE_NAME),
        );
        self.run_stage(invocation, way_id)
    }

    fn extract_nodes(&mut self, dir: &Path, way_id: WayId, node_refs: &[NodeId]) -> Result<PathBuf> {
        let mut inputs = vec![self.bulk_path.clone().into_os_string()];
        inputs.extend(unique_in_order(node_refs).into_iter().map(|id| OsString::from(format!("n{}", id))));

        let invocation = Invocation::new(Stage::ExtractNodes, inputs, dir.join(NODES_FILE_NAME));
        self.run_stage(invocation, way_id)
    }

    fn merge(&mut self, dir: &Path, way_id: WayId, nodes_file: PathBuf, way_file: PathBuf) -> Result<PathBuf> {
        let invocation = Invocation::new(
            Stage::Merge,
            vec![nodes_file.into_os_string(), way_file.into_os_string()],
            dir.join(MERGED_FILE_NAME),
        );
        self.run_stage(invocation, way_id)
    }

    fn add_locations(&mut self, dir: &Path, way_id: WayId, merged_file: PathBuf) -> Result<PathBuf> {
        // Dangling references are left without a location and reported by the
        // assembler with the node id.
        let invocation = Invocation::new(
            Stage::AddLocations,
            vec![merged_file.into_os_string()],
            dir.join(LOCATED_FILE_NAME),
        ).with_option("--ignore-missing-nodes");
        self.run_stage(invocation, way_id)
    }

    fn run_pipeline(&mut self, dir: &Path, way_id: WayId) -> Result<RawWay> {
        let way_file = self.extract_way(dir, way_id)?;
        let way = osm_xml::read_document(&way_file)?
            .take_way(way_id)
            .ok_or(Error::WayNotFound { way_id })?;
        if way.node_refs.is_empty() {
            return Err(Error::EmptyWay { way_id });
        }

        let nodes_file = self.extract_nodes(dir, way_id, &way.node_ids())?;
        let merged_file = self.merge(dir, way_id, nodes_file, way_file)?;
        let located_file = self.add_locations(dir, way_id, merged_file)?;

        let mut located = osm_xml::read_document(&located_file)?;
        let way = located.take_way(way_id).ok_or(Error::WayNotFound { way_id })?;
        let coordinates = located.coordinates_for(&way);

        Ok(RawWay {
            id: way_id,
            node_refs: way.node_ids(),
            tags: way.tags,
            coordinates,
        })
    }
}

impl<T: OsmTool> WaySource for LocalExtractor<T> {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn extract(&mut self, way_id: WayId) -> Result<RawWay> {
        self.tool.ensure_available()?;

        let dir = self.scratch_dir()?;
        let raw = self.run_pipeline(dir.path(), way_id)?;
        dir.close()?;
        Ok(raw)
    }
}

fn unique_in_order(node_refs: &[NodeId]) -> Vec<NodeId> {
    let mut seen = HashSet::new();
    node_refs
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
