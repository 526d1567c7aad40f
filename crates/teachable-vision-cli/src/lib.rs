//! Trainer internals — backend bridge, session controller, cancellation,
//! and CLI configuration.

pub mod backend;
pub mod cancel;
pub mod config;
pub mod error;
pub mod session;

pub use backend::BackendClient;
pub use cancel::CancelToken;
pub use error::{CliError, CliResult};
pub use session::TrainerSession;
