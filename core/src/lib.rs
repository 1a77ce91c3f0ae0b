pub mod errors;
pub mod monitor;
pub mod remote;
pub mod syncer;
