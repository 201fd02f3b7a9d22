//! Library side of the `lead-mapper` binary: logging setup and the
//! read-map-save pipeline shared by the subcommands.

pub mod logging;
pub mod pipeline;
pub mod types;
