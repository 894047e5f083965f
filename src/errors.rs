use std::{fmt, io, num::{ParseFloatError, ParseIntError}};
use quick_xml::events::attributes::AttrError;

use crate::data::osm::{NodeId, WayId};
use crate::osmium::Stage;

#[derive(Debug)]
pub enum Error {
    InvalidArgument(String),
    ToolNotFound {
        program: String,
    },
    ExtractionTool {
        stage: Stage,
        exit_code: Option<i32>,
        stderr: String,
    },
    WayNotFound {
        way_id: WayId,
    },
    EmptyWay {
        way_id: WayId,
    },
    MissingNode {
        node_id: NodeId,
    },
    DegenerateGeometry {
        node_count: usize,
    },
    RemoteService {
        status: u16,
    },
    RemoteTimeout,
    RemoteTransport(String),
    Config(String),
    Parse(String),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::ToolNotFound { program } => {
                write!(f, "The '{}' CLI tool is not installed or not in PATH", program)
            },
            Error::ExtractionTool { stage, exit_code: Some(code), stderr } => {
                write!(f, "Stage '{}' exited with code {}: {}", stage, code, stderr)
            },
            Error::ExtractionTool { stage, exit_code: None, stderr } => {
                write!(f, "Stage '{}' was terminated by a signal: {}", stage, stderr)
            },
            Error::WayNotFound { way_id } => write!(f, "Way {} not found", way_id),
            Error::EmptyWay { way_id } => write!(f, "Way {} has no node references", way_id),
            Error::MissingNode { node_id } => write!(f, "Node {} not found in extracted data", node_id),
            Error::DegenerateGeometry { node_count } => {
                write!(f, "A line needs at least 2 points, got {}", node_count)
            },
            Error::RemoteService { status } => write!(f, "Query service returned status {}", status),
            Error::RemoteTimeout => write!(f, "Query service did not answer in time"),
            Error::RemoteTransport(msg) => write!(f, "Query service request failed: {}", msg),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Error::Io(value)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(value: quick_xml::Error) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<AttrError> for Error {
    fn from(value: AttrError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<ParseFloatError> for Error {
    fn from(value: ParseFloatError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<ParseIntError> for Error {
    fn from(value: ParseIntError) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Parse(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
