//! Widget node types: WidgetId, Widget, LayoutSlot.

use slotmap::new_key_type;

use crate::geometry::{Axis, Spacing};
use crate::layout::Layout2d;

new_key_type! {
    /// Unique identifier for a widget. Copy, lightweight (u64).
    pub struct WidgetId;
}

/// One of the four layouts every widget owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutSlot {
    PositionX,
    PositionY,
    Width,
    Height,
}

impl LayoutSlot {
    pub const ALL: [LayoutSlot; 4] = [
        LayoutSlot::PositionX,
        LayoutSlot::PositionY,
        LayoutSlot::Width,
        LayoutSlot::Height,
    ];

    /// Axis of the layout stored in this slot.
    pub fn axis(self) -> Axis {
        match self {
            LayoutSlot::PositionX | LayoutSlot::Width => Axis::X,
            LayoutSlot::PositionY | LayoutSlot::Height => Axis::Y,
        }
    }
}

/// A specific layout of a specific widget: the unit of dependency tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dependent {
    pub widget: WidgetId,
    pub slot: LayoutSlot,
}

impl Dependent {
    pub fn new(widget: WidgetId, slot: LayoutSlot) -> Self {
        Self { widget, slot }
    }
}

/// Data associated with a single widget.
#[derive(Debug, Clone, Default)]
pub struct Widget {
    /// Name used by string bindings (`"b1.width"`). Empty means unnamed.
    pub(crate) name: String,
    pub(crate) position: Layout2d,
    pub(crate) size: Layout2d,
    /// Container padding, subtracted from the size to give the inner size.
    pub(crate) padding: Spacing,
}

impl Widget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn padding(&self) -> Spacing {
        self.padding
    }

    /// Layout stored in `slot`.
    pub fn layout(&self, slot: LayoutSlot) -> &crate::layout::Layout {
        match slot {
            LayoutSlot::PositionX => &self.position.x,
            LayoutSlot::PositionY => &self.position.y,
            LayoutSlot::Width => &self.size.x,
            LayoutSlot::Height => &self.size.y,
        }
    }

    pub(crate) fn layout_mut(&mut self, slot: LayoutSlot) -> &mut crate::layout::Layout {
        match slot {
            LayoutSlot::PositionX => &mut self.position.x,
            LayoutSlot::PositionY => &mut self.position.y,
            LayoutSlot::Width => &mut self.size.x,
            LayoutSlot::Height => &mut self.size.y,
        }
    }
}
