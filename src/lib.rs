//! cypherlats: natural-language questions to Cypher via tree search.
//!
//! The binary is a thin shell over `cypherlats-search`; these modules are
//! shared with it so they can be tested.

pub mod format;
pub mod logging;
pub mod settings;

pub use format::{format_outcome, OutputFormat};
pub use settings::{load_config, resolve, Overrides};
