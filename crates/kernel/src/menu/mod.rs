//! Navigation menus.
//!
//! Menu entries come from enabled pages whose menu config is enabled and are
//! grouped by menu id (e.g., "main", "user").

mod registry;

pub use registry::{MenuItem, MenuRegistry};
