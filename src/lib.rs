//! # tgui-layout
//!
//! Layout expressions for retained-mode widget trees. Positions and sizes are
//! bound to expressions such as `"b1.right + parent.width / 2"` or
//! `"{&.w - 20, 50%}"` and stay up to date as the tree changes.
//!
//! ## Core Systems
//!
//! - **[`expr`]**: logos tokenizer, recursive descent parser, evaluator, formatter
//! - **[`layout`]**: cached [`Layout`] / [`Layout2d`] values, bind helpers, binding resolution
//! - **[`widget`]**: slotmap-backed [`WidgetTree`] with dependency tracking
//! - **[`geometry`]**: Vector2, Spacing, Axis primitives
//! - **[`config`]**: name matching and parse warning settings
//!
//! ```
//! use tgui_layout::{WidgetTree, Vector2};
//!
//! let mut tree = WidgetTree::new();
//! let gui = tree.insert_root();
//! tree.set_size(gui, (800.0, 600.0));
//!
//! let panel = tree.add(gui, "panel");
//! tree.set_size(panel, "{50%, &.h - 100}");
//! assert_eq!(tree.size(panel), Vector2::new(400.0, 500.0));
//!
//! tree.set_size(gui, (1000.0, 600.0));
//! assert_eq!(tree.width(panel), 500.0);
//! ```

// Foundation
pub mod config;
pub mod error;
pub mod geometry;

// Expression language
pub mod expr;

// Layout values
pub mod layout;

// Widget arena
pub mod widget;

pub use config::LayoutConfig;
pub use error::ParseError;
pub use geometry::{Axis, Spacing, Vector2};
pub use layout::{bind::*, Detached, IntoLayout, IntoLayout2d, Layout, Layout2d, LayoutHost};
pub use widget::{LayoutSlot, WidgetId, WidgetTree};
