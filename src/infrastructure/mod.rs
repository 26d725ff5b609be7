//! Infrastructure layer: storage engines, collaborator adapters, config, logging.

pub mod activity;
pub mod config;
pub mod logging;
pub mod residents;
pub mod storage;
