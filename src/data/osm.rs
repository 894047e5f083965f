use std::{collections::BTreeMap, fmt, str::FromStr};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::errors::{Error, Result};

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WayId(i64);

impl WayId {
    pub fn new(id: i64) -> Result<WayId> {
        if id <= 0 {
            return Err(Error::InvalidArgument(format!("way id must be positive, got {}", id)));
        }
        Ok(WayId(id))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WayId {
    type Err = Error;

    /// Accepts `123`, `w123`, `way/123` or an openstreetmap.org way URL.
    fn from_str(s: &str) -> Result<Self> {
        lazy_static! {
            static ref WAY_ID_RE: Regex = Regex::new(
                r"^(?:(?:https?://)?(?:www\.)?openstreetmap\.org/way/|way/|w)?(?P<id>\d+)/?$"
            ).unwrap();
        }
        let invalid = || Error::InvalidArgument(format!("'{}' is not a way id", s));

        let captures = WAY_ID_RE.captures(s.trim()).ok_or_else(invalid)?;
        let id = captures
            .name("id")
            .ok_or_else(invalid)?
            .as_str()
            .parse::<i64>()
            .map_err(|_| invalid())?;
        WayId::new(id)
    }
}

/// WGS84 degrees, no altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Coordinate {
        Coordinate { lon, lat }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Coordinate { lon, lat }
    }
}
