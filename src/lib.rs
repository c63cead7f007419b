//! Library crate for portmaster: a client for the PortMaster scanning backend.
pub mod client;
pub mod config;
pub mod error;
pub mod form;
pub mod history;
pub mod poller;
pub mod render;
pub mod risk;
pub mod session;
pub mod types;

pub use client::{HttpScanClient, PdfReport, ScanApi};
pub use config::ClientConfig;
pub use error::{ClientError, ValidationError};
pub use form::ScanForm;
pub use session::ScanSession;
