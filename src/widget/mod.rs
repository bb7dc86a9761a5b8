//! Widget arena: ids, per-widget layouts, tree structure.

pub mod node;
pub mod tree;

pub use node::{Dependent, LayoutSlot, Widget, WidgetId};
pub use tree::WidgetTree;
