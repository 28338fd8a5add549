//! Configuration error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::range::RangeError;

/// Errors that abort reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened.
    #[error("can't open config file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading failed part way through.
    #[error("error reading config file: {0}")]
    Read(#[from] io::Error),

    /// A line violates the grammar. The whole file is rejected.
    #[error("line {line}: {kind}: {text}")]
    Parse {
        line: usize,
        text: String,
        kind: ParseErrorKind,
    },
}

impl ConfigError {
    /// The grammar violation, if this is a parse error.
    pub fn parse_kind(&self) -> Option<&ParseErrorKind> {
        match self {
            ConfigError::Parse { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// Grammar violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unrecognized line")]
    UnrecognizedLine,

    #[error("printer before cluster")]
    PrinterBeforeCluster,

    #[error("workstation before cluster")]
    WorkstationBeforeCluster,

    #[error("unknown cluster name {0}")]
    UnknownCluster(String),

    #[error("cluster {0} already in cluster group")]
    ClusterAlreadyGrouped(String),

    #[error("unrecognized option {0}")]
    UnrecognizedOption(String),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("invalid coordinate {0}")]
    InvalidCoordinate(String),

    #[error(transparent)]
    InvalidRange(#[from] RangeError),
}
