//! Layout values: cached 1-D and 2-D layouts, bind helpers, binding resolution.

pub mod bind;
#[allow(clippy::module_inception)]
pub mod layout;
pub mod layout2d;
pub mod resolve;

pub use bind::*;
pub use layout::{IntoLayout, Layout};
pub use layout2d::{IntoLayout2d, Layout2d};
pub use resolve::{Detached, LayoutHost};
