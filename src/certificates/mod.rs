//! Certificates module
//!
//! Assembles render-ready certificate data for participants who passed an
//! activity. Rendering happens client-side.

pub mod service;
pub mod store;
pub mod types;

pub use service::{CertificateError, CertificateService};
pub use store::TemplateStore;
pub use types::*;
