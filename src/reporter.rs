//! The single JSON record a fix request produces, and its exit status.

use crate::error::{FixError, EXIT_OK};
use crate::extractor::FixSuggestion;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::io::{self, Write};

pub const NO_FIX_REASON: &str = "No confident fix";

/// What the calling shell receives on stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputRecord {
    /// `{"command", "reason"[, "autoConfirm": true]}`
    Fix {
        command: String,
        reason: String,
        auto_confirm: bool,
    },
    /// `{"command": "", "reason"}`
    NoFix { reason: String },
    /// `{"error"}`
    Error { message: String },
}

impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutputRecord::Fix {
                command,
                reason,
                auto_confirm,
            } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("command", command)?;
                map.serialize_entry("reason", reason)?;
                if *auto_confirm {
                    map.serialize_entry("autoConfirm", &true)?;
                }
                map.end()
            }
            OutputRecord::NoFix { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("command", "")?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
            OutputRecord::Error { message } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub record: OutputRecord,
    pub exit_code: i32,
}

/// Turns the outcome of a fix request into the record to print.
///
/// A missing suggestion or an empty command is a successful run with a
/// no-fix record, not a failure.
pub fn report(outcome: Result<Option<FixSuggestion>, FixError>, auto_confirm: bool) -> Report {
    match outcome {
        Err(err) => Report {
            exit_code: err.exit_code(),
            record: OutputRecord::Error {
                message: err.to_string(),
            },
        },
        Ok(Some(suggestion)) if suggestion.has_command() => Report {
            record: OutputRecord::Fix {
                command: suggestion.command,
                reason: suggestion.reason,
                auto_confirm,
            },
            exit_code: EXIT_OK,
        },
        Ok(suggestion) => {
            let reason = suggestion
                .map(|s| s.reason)
                .filter(|reason| !reason.is_empty())
                .unwrap_or_else(|| NO_FIX_REASON.to_string());
            Report {
                record: OutputRecord::NoFix { reason },
                exit_code: EXIT_OK,
            }
        }
    }
}

/// Writes `record` as one compact JSON line.
pub fn emit<W: Write>(writer: &mut W, record: &OutputRecord) -> io::Result<()> {
    let line = serde_json::to_string(record).map_err(io::Error::from)?;
    writeln!(writer, "{}", line)?;
    writer.flush()
}
