use std::collections::HashMap;
use std::io;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ResolverConfig;
use crate::data::RawWay;
use crate::data::osm::{Coordinate, NodeId, Tags, WayId};
use crate::errors::{Error, Result};

use super::WaySource;

pub const SOURCE_NAME: &str = "remote";

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    #[serde(default)]
    tags: Tags,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    nodes: Vec<i64>,
}

/// Resolves ways through an Overpass query service. One request per way, no
/// retries.
pub struct RemoteResolver {
    agent: ureq::Agent,
    endpoint: String,
    timeout_secs: u64,
}

impl RemoteResolver {
    pub fn new(config: &ResolverConfig) -> RemoteResolver {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.overpass_timeout())
            .user_agent(&config.user_agent)
            .build();

        RemoteResolver {
            agent,
            endpoint: config.overpass_url.clone(),
            timeout_secs: config.overpass_timeout_secs,
        }
    }

    fn fetch(&self, query: &str) -> Result<String> {
        let response = match self.agent.post(&self.endpoint).send_form(&[("data", query)]) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => return Err(Error::RemoteService { status }),
            Err(ureq::Error::Transport(transport)) => {
                if is_timeout(&transport) {
                    return Err(Error::RemoteTimeout);
                }
                return Err(Error::RemoteTransport(transport.to_string()));
            },
        };
        info!(status = response.status(); "Received response");

        response.into_string().map_err(|err| match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::RemoteTimeout,
            _ => err.into(),
        })
    }
}

impl WaySource for RemoteResolver {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn extract(&mut self, way_id: WayId) -> Result<RawWay> {
        let query = build_query(way_id, self.timeout_secs);
        debug!(query = query.as_str(); "Overpass query");

        let body = self.fetch(&query)?;
        parse_response(way_id, &body)
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    std::error::Error::source(transport)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map_or(false, |err| matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock))
}

/// The way and, through recursion down, every node it references.
pub fn build_query(way_id: WayId, timeout_secs: u64) -> String {
    format!("[out:json][timeout:{}];way({});(._;>;);out body;", timeout_secs, way_id)
}

pub fn parse_response(way_id: WayId, body: &str) -> Result<RawWay> {
    let mut document: Value = serde_json::from_str(body)?;
    let elements: Vec<Element> = document
        .get_mut("elements")
        .map(Value::take)
        .and_then(|elements| serde_json::from_value(elements).ok())
        .ok_or(Error::WayNotFound { way_id })?;

    let mut coordinates = HashMap::new();
    let mut way: Option<Element> = None;
    for element in elements {
        if element.kind == "node" {
            if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                coordinates.insert(NodeId(element.id), Coordinate { lon, lat });
            }
        } else if element.kind == "way" && element.id == way_id.get() {
            way = Some(element);
        }
    }

    let way = way.ok_or(Error::WayNotFound { way_id })?;
    if way.nodes.is_empty() {
        return Err(Error::EmptyWay { way_id });
    }

    Ok(RawWay {
        id: way_id,
        tags: way.tags,
        node_refs: way.nodes.into_iter().map(NodeId).collect(),
        coordinates,
    })
}
