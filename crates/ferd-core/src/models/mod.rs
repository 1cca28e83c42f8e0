//! Data models shared by the extraction engine and its collaborators.

pub mod attachment;
pub mod config;
pub mod invoice;
