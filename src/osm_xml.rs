use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::osm::{Coordinate, NodeId, Tags, WayId};
use crate::errors::Result;

/// A `<nd>` child of a way. The location is only present once the
/// document went through `add-locations-to-ways`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub node_id: NodeId,
    pub location: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlWay {
    pub id: i64,
    pub tags: Tags,
    pub node_refs: Vec<NodeRef>,
}

impl XmlWay {
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.node_refs.iter().map(|nd| nd.node_id).collect()
    }
}

#[derive(Debug, Default)]
pub struct OsmDocument {
    pub ways: Vec<XmlWay>,
    pub nodes: HashMap<NodeId, Coordinate>,
}

impl OsmDocument {
    pub fn take_way(&mut self, way_id: WayId) -> Option<XmlWay> {
        let idx = self.ways.iter().position(|way| way.id == way_id.get())?;
        Some(self.ways.swap_remove(idx))
    }

    /// Coordinates for the given way, from `<node>` elements and from inline
    /// `<nd>` locations. Inline locations take precedence.
    pub fn coordinates_for(&self, way: &XmlWay) -> HashMap<NodeId, Coordinate> {
        let mut coordinates = HashMap::new();
        for nd in &way.node_refs {
            if let Some(location) = nd.location {
                coordinates.insert(nd.node_id, location);
            } else if let Some(location) = self.nodes.get(&nd.node_id) {
                coordinates.entry(nd.node_id).or_insert(*location);
            }
        }
        coordinates
    }
}

enum ParserState {
    Top,
    Way(XmlWay),
    Node,
}

fn parse_id(el: &BytesStart, key: &[u8]) -> Result<i64> {
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == key {
            return Ok(attribute.unescape_value()?.parse()?);
        }
    }
    Err(format!(
        "<{}> element without {} attribute",
        String::from_utf8_lossy(el.name().as_ref()),
        String::from_utf8_lossy(key),
    ).into())
}

fn parse_location(el: &BytesStart) -> Result<Option<Coordinate>> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"lat" => lat = Some(attribute.unescape_value()?.parse()?),
            b"lon" => lon = Some(attribute.unescape_value()?.parse()?),
            _ => (),
        }
    }

    Ok(lat.zip(lon).map(|(lat, lon)| Coordinate { lon, lat }))
}

fn parse_tag(el: &BytesStart) -> Result<(String, String)> {
    let mut key: Option<String> = None;
    let mut value: Option<String> = None;

    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"k" => key = Some(attribute.unescape_value()?.into_owned()),
            b"v" => value = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }

    Ok((key.ok_or("<tag> element without k attribute")?, value.unwrap_or_default()))
}

fn parse_way(el: &BytesStart) -> Result<XmlWay> {
    Ok(XmlWay {
        id: parse_id(el, b"id")?,
        tags: Tags::new(),
        node_refs: Vec::new(),
    })
}

fn parse_nd(el: &BytesStart) -> Result<NodeRef> {
    Ok(NodeRef {
        node_id: NodeId(parse_id(el, b"ref")?),
        location: parse_location(el)?,
    })
}

fn add_node(document: &mut OsmDocument, el: &BytesStart) -> Result<()> {
    let node_id = NodeId(parse_id(el, b"id")?);
    // Deleted nodes carry no location.
    if let Some(location) = parse_location(el)? {
        document.nodes.insert(node_id, location);
    }
    Ok(())
}

fn add_way_child(way: &mut XmlWay, el: &BytesStart) -> Result<()> {
    match el.name().as_ref() {
        b"nd" => way.node_refs.push(parse_nd(el)?),
        b"tag" => {
            let (key, value) = parse_tag(el)?;
            way.tags.insert(key, value);
        },
        _ => (),
    }
    Ok(())
}

pub fn parse_document<R: BufRead>(input: R) -> Result<OsmDocument> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut document = OsmDocument::default();
    let mut state = ParserState::Top;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        state = match (state, event) {
            (_, Event::Eof) => break,
            (ParserState::Top, Event::Start(e)) => match e.name().as_ref() {
                b"way" => ParserState::Way(parse_way(&e)?),
                b"node" => {
                    add_node(&mut document, &e)?;
                    ParserState::Node
                },
                _ => ParserState::Top,
            },
            (ParserState::Top, Event::Empty(e)) => {
                match e.name().as_ref() {
                    b"way" => document.ways.push(parse_way(&e)?),
                    b"node" => add_node(&mut document, &e)?,
                    _ => (),
                }
                ParserState::Top
            },
            (ParserState::Way(mut way), Event::Start(e) | Event::Empty(e)) => {
                add_way_child(&mut way, &e)?;
                ParserState::Way(way)
            },
            (ParserState::Way(way), Event::End(e)) if e.name().as_ref() == b"way" => {
                document.ways.push(way);
                ParserState::Top
            },
            (ParserState::Node, Event::End(e)) if e.name().as_ref() == b"node" => ParserState::Top,
            (state, _) => state,
        };
        buf.clear();
    }

    Ok(document)
}

pub fn read_document(path: &Path) -> Result<OsmDocument> {
    let file = fs::File::open(path)?;
    parse_document(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    const LOCATED: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<osm version="0.6" generator="osmium/1.16.0">
  <node id="12" version="1" lat="1.0" lon="1.0"/>
  <node id="20" version="3" lat="5.5" lon="6.5">
    <tag k="highway" v="crossing"/>
  </node>
  <way id="123" version="4">
    <nd ref="10" lat="0.0" lon="0.0"/>
    <nd ref="11" lat="0.0" lon="1.0"/>
    <nd ref="12"/>
    <nd ref="10" lat="0.0" lon="0.0"/>
    <tag k="highway" v="residential"/>
    <tag k="name" v="Rue &amp; Co"/>
  </way>
  <way id="124"/>
</osm>
"#;

    #[test]
    fn test_parse_way_with_locations() {
        let mut document = parse_document(LOCATED.as_bytes()).unwrap();
        assert_eq!(document.ways.len(), 2);

        let way = document.take_way(WayId::new(123).unwrap()).unwrap();
        assert_eq!(way.tags["highway"], "residential");
        assert_eq!(way.tags["name"], "Rue & Co");
        assert_eq!(way.node_ids(), vec![NodeId(10), NodeId(11), NodeId(12), NodeId(10)]);
        assert_eq!(way.node_refs[1].location, Some(Coordinate::new(1.0, 0.0)));
        assert_eq!(way.node_refs[2].location, None);
    }

    #[test]
    fn test_node_tags_do_not_leak_into_ways() {
        let mut document = parse_document(LOCATED.as_bytes()).unwrap();
        assert_eq!(document.nodes[&NodeId(20)], Coordinate::new(6.5, 5.5));

        let way = document.take_way(WayId::new(124).unwrap()).unwrap();
        assert!(way.tags.is_empty());
        assert!(way.node_refs.is_empty());
    }

    #[test]
    fn test_coordinates_for_falls_back_to_node_elements() {
        let mut document = parse_document(LOCATED.as_bytes()).unwrap();
        let way = document.take_way(WayId::new(123).unwrap()).unwrap();

        let coordinates = document.coordinates_for(&way);
        assert_eq!(coordinates.len(), 3);
        assert_eq!(coordinates[&NodeId(12)], Coordinate::new(1.0, 1.0));
        assert_eq!(coordinates[&NodeId(10)], Coordinate::new(0.0, 0.0));
    }

    #[test]
    fn test_missing_way() {
        let mut document = parse_document(LOCATED.as_bytes()).unwrap();
        assert!(document.take_way(WayId::new(999).unwrap()).is_none());
    }

    #[test]
    fn test_nd_without_ref_is_rejected() {
        let xml = r#"<osm><way id="1"><nd lat="0" lon="0"/></way></osm>"#;
        let result = parse_document(xml.as_bytes());
        assert!(matches!(result, Err(Error::Parse(_))));
    }

    #[test]
    fn test_bad_coordinate_is_rejected() {
        let xml = r#"<osm><way id="1"><nd ref="1" lat="north" lon="0"/></way></osm>"#;
        assert!(parse_document(xml.as_bytes()).is_err());
    }
}
