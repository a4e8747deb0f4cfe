pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod passthrough;
pub mod registrar;
pub mod setup_cmd;
pub mod util;
