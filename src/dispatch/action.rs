//! Farm command catalog

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Tag of a farm command, without parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Print,
    Pause,
    Resume,
    Cancel,
    Load,
    LoadFile,
    Preheat,
    Shutdown,
    Finish,
}

impl ActionKind {
    pub const ALL: [Self; 9] = [
        Self::Print,
        Self::Pause,
        Self::Resume,
        Self::Cancel,
        Self::Load,
        Self::LoadFile,
        Self::Preheat,
        Self::Shutdown,
        Self::Finish,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Cancel => "cancel",
            Self::Load => "load",
            Self::LoadFile => "load-file",
            Self::Preheat => "preheat",
            Self::Shutdown => "shutdown",
            Self::Finish => "finish",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("unknown action: {s}")))
    }
}

/// A G-code file to push to every target printer
#[derive(Clone)]
pub struct Upload {
    /// Client-supplied file name, already sanitised
    pub file_name: String,
    pub content: Arc<[u8]>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.content.len())
            .finish()
    }
}

/// A farm command with its parameters
#[derive(Debug, Clone)]
pub enum Action {
    /// Start the loaded job
    Print,
    Pause,
    Resume,
    Cancel,
    /// Upload a file, then select and print it
    Load(Upload),
    /// Select and print a file already stored on the printer
    LoadFile { file_name: String },
    /// Set tool and bed target temperatures (°C)
    Preheat { tool: u16, bed: u16 },
    /// Shut down the printer's host system
    Shutdown,
    /// Clear the active flag of each target; no device traffic
    Finish,
}

impl Action {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Print => ActionKind::Print,
            Self::Pause => ActionKind::Pause,
            Self::Resume => ActionKind::Resume,
            Self::Cancel => ActionKind::Cancel,
            Self::Load(_) => ActionKind::Load,
            Self::LoadFile { .. } => ActionKind::LoadFile,
            Self::Preheat { .. } => ActionKind::Preheat,
            Self::Shutdown => ActionKind::Shutdown,
            Self::Finish => ActionKind::Finish,
        }
    }
}
