//! Binding resolution: the seam between layouts and the widget tree.
//!
//! A string binding such as `"parent.b1.width"` names widgets symbolically.
//! [`resolve_path`] walks those names against a [`LayoutHost`], starting at the
//! widget that owns the layout. Failures are `None`; the evaluator turns them
//! into `0` and the next structural change retries them.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::expr::ast::{Property, Segment};
use crate::widget::node::{Dependent, WidgetId};

/// The widget tree as seen by a layout during evaluation.
pub trait LayoutHost {
    fn config(&self) -> &LayoutConfig;

    /// Whether `id` still refers to a live widget.
    fn contains(&self, id: WidgetId) -> bool;

    fn parent(&self, id: WidgetId) -> Option<WidgetId>;

    fn children(&self, id: WidgetId) -> &[WidgetId];

    fn name(&self, id: WidgetId) -> Option<&str>;

    /// Current value of a scalar property of `id`, recomputing stale layouts.
    fn read(&self, id: WidgetId, property: Property) -> f64;

    /// Record that `dependent` read `source` and must be invalidated when it changes.
    fn track(&self, source: Dependent, dependent: Dependent);

    /// Child of `id` whose name matches `name` under the host's config.
    fn child_named(&self, id: WidgetId, name: &str) -> Option<WidgetId> {
        let config = self.config();
        self.children(id)
            .iter()
            .copied()
            .find(|&child| self.name(child).is_some_and(|n| config.names_match(n, name)))
    }
}

// ---------------------------------------------------------------------------
// Detached
// ---------------------------------------------------------------------------

/// Host for layouts that belong to no tree: every binding reads as `0`.
#[derive(Debug, Clone, Default)]
pub struct Detached {
    config: LayoutConfig,
}

impl LayoutHost for Detached {
    fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn contains(&self, _id: WidgetId) -> bool {
        false
    }

    fn parent(&self, _id: WidgetId) -> Option<WidgetId> {
        None
    }

    fn children(&self, _id: WidgetId) -> &[WidgetId] {
        &[]
    }

    fn name(&self, _id: WidgetId) -> Option<&str> {
        None
    }

    fn read(&self, _id: WidgetId, _property: Property) -> f64 {
        0.0
    }

    fn track(&self, _source: Dependent, _dependent: Dependent) {}
}

// ---------------------------------------------------------------------------
// Path resolution
// ---------------------------------------------------------------------------

/// Walk `segments` from `owner`.
///
/// `Parent` climbs one level. A name is looked up among the current widget's
/// children first and then among its siblings. An empty path is the owner.
pub fn resolve_path(
    host: &dyn LayoutHost,
    owner: Option<WidgetId>,
    segments: &[Segment],
) -> Option<WidgetId> {
    let mut current = owner?;
    for segment in segments {
        current = match segment {
            Segment::Parent => host.parent(current)?,
            Segment::Name(name) => host.child_named(current, name).or_else(|| {
                host.parent(current)
                    .and_then(|parent| host.child_named(parent, name))
            })?,
        };
    }
    Some(current)
}

/// Memoised path resolutions of one layout.
///
/// Failed lookups are memoised too. [`ResolutionCache::refresh`] runs after
/// structural changes so they are retried once the tree can satisfy them.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: RefCell<HashMap<Vec<Segment>, Option<WidgetId>>>,
}

impl ResolutionCache {
    pub fn resolve(
        &self,
        host: &dyn LayoutHost,
        owner: Option<WidgetId>,
        segments: &[Segment],
    ) -> Option<WidgetId> {
        if let Some(hit) = self.entries.borrow().get(segments) {
            return *hit;
        }
        let resolved = resolve_path(host, owner, segments);
        self.entries.borrow_mut().insert(segments.to_vec(), resolved);
        resolved
    }

    /// Re-run every memoised path against the current tree.
    ///
    /// Returns `true` if any entry now resolves to a different widget.
    pub fn refresh(&self, host: &dyn LayoutHost, owner: Option<WidgetId>) -> bool {
        let mut changed = false;
        for (segments, resolved) in self.entries.borrow_mut().iter_mut() {
            let current = resolve_path(host, owner, segments);
            if current != *resolved {
                *resolved = current;
                changed = true;
            }
        }
        changed
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
