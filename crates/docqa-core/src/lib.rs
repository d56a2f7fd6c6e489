#![deny(dead_code)]
#![deny(unused_variables)]

//! Shared building blocks for the docqa workspace: domain types, the error
//! taxonomy, provider traits, the provider call policy, configuration, content
//! validation and the chunker.

pub mod chunker;
pub mod config;
pub mod error;
pub mod policy;
pub mod traits;
pub mod types;
pub mod validate;
