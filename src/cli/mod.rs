//! # CLI Module
//!
//! Command-line entry points for the `frontgate` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Run the gateway with the bundled echo application:
//!
//! ```bash
//! frontgate serve --config config/config.yaml --port 9000 --base-dir public
//! ```
//!
//! Flags override the matching config file values. Without `--config` the
//! built-in defaults are used.
//!
//! ### `routes`
//!
//! Print the action table the classifier would use:
//!
//! ```bash
//! frontgate routes --config config/config.yaml
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{resolve_config, run_cli, Cli, Commands, ServeArgs};
