//! Library crate for scanboard: scan status aggregation and board rendering.
pub mod activity;
pub mod clock;
pub mod config;
pub mod normalize;
pub mod render;
pub mod rollup;
pub mod seed;
pub mod server;
pub mod simulate;
pub mod source;
pub mod store;
pub mod types;
pub mod view;
