//! Named render services.
//!
//! Services are registered once at startup and looked up by the names used
//! in `Service@method` callbacks and the `[shortcodes]` table.

mod hello;
mod registry;

pub use hello::HelloService;
pub use registry::ServiceRegistry;
