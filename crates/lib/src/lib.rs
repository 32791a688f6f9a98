//! juce-dist-lib: build and packaging pipeline for JUCE modules.
//!
//! This crate provides every stage of the distribution pipeline:
//! - `provision`: install native dependencies per target triplet
//! - `merge`: combine single-architecture static libraries into universal binaries
//! - `assemble`: overlay headers, sources and libraries into a module tree
//! - `version`: stamp the module tree with a version record
//! - `archive` / `publish`: zip the module tree and push it to object storage
//!
//! `pipeline` strings the stages together for the two CLI invocations.

pub mod archive;
pub mod assemble;
pub mod config;
pub mod consts;
pub mod git;
pub mod merge;
pub mod pipeline;
pub mod platform;
pub mod provision;
pub mod publish;
pub mod runner;
pub mod util;
pub mod version;
