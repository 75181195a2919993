mod commands;
pub mod context;
pub mod docker;
pub mod failure;
pub mod genesis;
pub mod infos;
pub mod keypair;
pub mod launch;
pub mod scenario;
pub mod stop;

// Re-export all items from commands module
pub use commands::*;
