//! Core traits for the IPAM sync system
//!
//! - [`DocumentStore`]: Load and save category documents

pub mod document_store;

pub use document_store::{DocumentHeader, DocumentStore};
