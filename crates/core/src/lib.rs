//! Document access and page-comment workflows for shared PDFs.
//!
//! The services in [`services`] run against the [`store::RecordStore`] and
//! [`store::BlobStore`] capability traits; adapters for PostgreSQL, the local
//! filesystem and memory live in [`store`].

pub mod auth;
pub mod comment;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod identity;
pub mod retry;
pub mod services;
pub mod store;

pub use error::{Error, Result};
