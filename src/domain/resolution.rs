//! Resolution directives
//!
//! A directive names a pending timetable entry and says how to settle it. Test
//! authors write either a bare name or an explicit record; both normalize to a
//! [`NormalizedResolution`] before the engine touches the timetable.

use crate::domain::deferred::Payload;
use crate::domain::types::EntryName;
use crate::error::{Error, Result};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How a directive settles its entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    #[default]
    #[display("settle")]
    Settle,
    #[display("abort")]
    Abort,
}

impl FromStr for ResolutionKind {
    type Err = Error;

    fn from_str(kind: &str) -> Result<Self> {
        match kind {
            "settle" => Ok(Self::Settle),
            "abort" => Ok(Self::Abort),
            other => Err(Error::invalid_resolution(format!(
                "resolution kind must be either \"settle\" or \"abort\", got \"{other}\""
            ))),
        }
    }
}

/// A directive as written by the test author
///
/// `Explicit` keeps its fields loose on purpose so malformed fixtures can be
/// represented and rejected by [`Resolution::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution {
    ByName(String),
    Explicit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Payload,
    },
}

impl Resolution {
    pub fn settle(name: impl Into<String>) -> Self {
        Self::Explicit {
            name: Some(name.into()),
            kind: Some(ResolutionKind::Settle.to_string()),
            payload: None,
        }
    }

    pub fn abort(name: impl Into<String>) -> Self {
        Self::Explicit {
            name: Some(name.into()),
            kind: Some(ResolutionKind::Abort.to_string()),
            payload: None,
        }
    }

    /// Attach a settlement payload, turning a bare name into an explicit record
    pub fn with_payload(self, value: Value) -> Self {
        match self {
            Self::ByName(name) => Self::Explicit {
                name: Some(name),
                kind: None,
                payload: Some(value),
            },
            Self::Explicit { name, kind, .. } => Self::Explicit {
                name,
                kind,
                payload: Some(value),
            },
        }
    }

    /// Validate and canonicalize; a missing kind defaults to settle
    pub fn normalize(&self) -> Result<NormalizedResolution> {
        match self {
            Self::ByName(name) => Ok(NormalizedResolution {
                name: entry_name(name)?,
                kind: ResolutionKind::Settle,
                payload: None,
            }),
            Self::Explicit {
                name,
                kind,
                payload,
            } => {
                let name = name
                    .as_deref()
                    .ok_or_else(|| Error::invalid_resolution("resolution must have a name"))
                    .and_then(entry_name)?;
                let kind = kind
                    .as_deref()
                    .map(ResolutionKind::from_str)
                    .transpose()?
                    .unwrap_or_default();

                Ok(NormalizedResolution {
                    name,
                    kind,
                    payload: payload.clone(),
                })
            }
        }
    }
}

fn entry_name(name: &str) -> Result<EntryName> {
    EntryName::try_new(name.to_string())
        .map_err(|_| Error::invalid_resolution("resolution must have a name"))
}

impl From<&str> for Resolution {
    fn from(name: &str) -> Self {
        Self::ByName(name.to_string())
    }
}

impl From<String> for Resolution {
    fn from(name: String) -> Self {
        Self::ByName(name)
    }
}

/// Canonical directive consumed by the timetable and the resolution engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResolution {
    pub name: EntryName,
    pub kind: ResolutionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Payload,
}

impl NormalizedResolution {
    /// Snapshot message recorded when this directive is simulated
    pub fn message(&self) -> String {
        format!("{}: {self}", crate::domain::snapshot::messages::RESOLUTION)
    }
}

impl fmt::Display for NormalizedResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.name, self.kind)
    }
}
