//! fk - suggest a fix for the last failed shell command.
//!
//! Given a failed command and its error output (both base64-encoded by the
//! calling shell), this library asks Gemini for a corrected command and
//! reduces whatever text comes back to a single JSON record:
//!
//! - `{"command": "...", "reason": "..."}` when a fix was found, with
//!   `"autoConfirm": true` when the user enabled auto-confirm
//! - `{"command": "", "reason": "..."}` when there is no confident fix
//! - `{"error": "..."}` when the request could not be completed
//!
//! # Architecture
//!
//! - [`decoder`] - base64 payload decoding
//! - [`prompt`] - the instruction template sent to the model
//! - [`request`] - the fix request and its bounded generation parameters
//! - [`http_client`] - HTTP client abstraction
//! - [`llm_generator`] - Gemini and mock text generators
//! - [`extractor`] - recovers the JSON object from model output
//! - [`reporter`] - output record and exit status
//! - [`config`] - persisted preferences and their validators
//! - [`fix_router`] - runs a fix request end to end
//! - [`error`] - error taxonomy and exit codes
//!
//! # Example
//!
//! ```ignore
//! use fk::config::Config;
//! use fk::fix_router::{FixInputs, FixRouter};
//! use fk::llm_generator::{GeminiGenerator, TextGenerator};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (config, _) = Config::load();
//!     let inputs = FixInputs {
//!         cmd_b64: Some("bHMgLWxh".to_string()), // "ls -la"
//!         ..Default::default()
//!     };
//!     let key = std::env::var("GEMINI_API_KEY").ok();
//!     let report = FixRouter::new(config)
//!         .process(inputs, key.as_deref(), |key| {
//!             Box::new(GeminiGenerator::new(key, Duration::from_secs(60))) as Box<dyn TextGenerator>
//!         })
//!         .await;
//!     fk::reporter::emit(&mut std::io::stdout(), &report.record).unwrap();
//! }
//! ```
//!
//! # Shell integration
//!
//! A PowerShell profile function typically encodes the last command and its
//! error, runs `fk`, and branches on the shape of the record:
//!
//! ```powershell
//! $b64 = { param($s) [Convert]::ToBase64String([Text.Encoding]::UTF8.GetBytes($s)) }
//! $out = fk --cmd-b64 (& $b64 $last) --err-b64 (& $b64 $err) | ConvertFrom-Json
//! if ($out.command) { Write-Host $out.reason; Invoke-Expression $out.command }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod fix_router;
pub mod http_client;
pub mod llm_generator;
pub mod prompt;
pub mod reporter;
pub mod request;
