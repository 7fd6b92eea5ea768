//! AGNSTK SDK
//!
//! The contract between the kernel and the services it renders. A service
//! implements [`Renderable`], declares what it provides through
//! [`Capabilities`], and is registered by name once at startup.

pub mod render;
pub mod types;

pub use render::{RenderArgs, RenderError, Renderable};
pub use types::{Capabilities, MenuConfig};

pub mod prelude {
    pub use crate::render::{RenderArgs, RenderError, Renderable};
    pub use crate::types::{Capabilities, MenuConfig};
}
