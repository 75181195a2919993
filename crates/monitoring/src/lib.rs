//! # Devnet Monitoring
//!
//! Logging initialization and the console implementation of the user feedback
//! capability.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use monitoring::{ConsoleFeedback, LogDestination, init_logging};
//! use domain::Feedback;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // LOG_DESTINATION=console for stdout, file (default) for daily rotating files
//!     init_logging().await?;
//!
//!     let feedback = ConsoleFeedback::new(LogDestination::from_env());
//!     feedback.success("ready");
//!     Ok(())
//! }
//! ```

pub mod feedback;
pub mod logging;

pub use feedback::{ConsoleFeedback, render_table};
pub use logging::{LogDestination, init_logging};
