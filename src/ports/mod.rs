//! Port traits between the numeric core and its outer surfaces.

pub mod config_port;
pub mod data_port;
