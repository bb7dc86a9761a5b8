//! Widget arena: structure, geometry setters, change propagation.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use slotmap::{SecondaryMap, SlotMap};
use tracing::trace;

use super::node::{Dependent, LayoutSlot, Widget, WidgetId};
use crate::config::LayoutConfig;
use crate::expr::ast::Property;
use crate::expr::format::to_expression_string;
use crate::geometry::{Spacing, Vector2};
use crate::layout::{IntoLayout, IntoLayout2d, Layout, Layout2d, LayoutHost};

/// Empty slice constant for returning when a widget has no children.
const EMPTY_CHILDREN: &[WidgetId] = &[];

/// The widget tree, backed by a slotmap arena.
///
/// Every widget owns four layouts (x, y, width, height). Reading a geometry
/// value evaluates the layout if it is dirty and records which slots it read;
/// setters walk those records to mark dependents dirty before returning.
pub struct WidgetTree {
    nodes: SlotMap<WidgetId, Widget>,
    children: SecondaryMap<WidgetId, Vec<WidgetId>>,
    parent: SecondaryMap<WidgetId, WidgetId>,
    /// Source slot → layouts that read it during their last evaluation.
    dependents: RefCell<HashMap<Dependent, HashSet<Dependent>>>,
    /// Layouts holding memoised string paths, re-resolved on structural changes.
    resolving: RefCell<HashSet<Dependent>>,
    config: LayoutConfig,
}

impl WidgetTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default())
    }

    pub fn with_config(config: LayoutConfig) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            dependents: RefCell::new(HashMap::new()),
            resolving: RefCell::new(HashSet::new()),
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Create a widget that is not part of any container yet.
    pub fn create(&mut self, name: impl Into<String>) -> WidgetId {
        let id = self.nodes.insert(Widget::new(name));
        self.children.insert(id, Vec::new());
        id
    }

    /// Create an unnamed top-level container. Its size plays the role of the
    /// view size for everything bound to it.
    pub fn insert_root(&mut self) -> WidgetId {
        self.create("")
    }

    /// Create a widget named `name` inside `parent`.
    ///
    /// If `parent` does not exist the widget is created detached.
    pub fn add(&mut self, parent: WidgetId, name: impl Into<String>) -> WidgetId {
        let id = self.create(name);
        self.reparent(id, parent);
        id
    }

    /// Move `node` (with its subtree) into `new_parent`.
    ///
    /// Returns `false` if either widget is missing or the move would put a
    /// widget inside its own subtree.
    pub fn reparent(&mut self, node: WidgetId, new_parent: WidgetId) -> bool {
        if !self.nodes.contains_key(node) || !self.nodes.contains_key(new_parent) {
            return false;
        }
        if node == new_parent || self.ancestors(new_parent).contains(&node) {
            return false;
        }

        self.unlink(node);
        self.parent.insert(node, new_parent);
        if let Some(siblings) = self.children.get_mut(new_parent) {
            siblings.push(node);
        }
        self.structure_changed();
        true
    }

    /// Take `node` out of its container. It stays in the arena.
    pub fn detach(&mut self, node: WidgetId) -> bool {
        if self.parent.get(node).is_none() {
            return false;
        }
        self.unlink(node);
        self.structure_changed();
        true
    }

    /// Remove a widget and all its descendants.
    ///
    /// Returns the removed widget's data, or `None` if it didn't exist.
    pub fn remove(&mut self, id: WidgetId) -> Option<Widget> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        let mut subtree = Vec::new();
        let mut to_visit = VecDeque::new();
        to_visit.push_back(id);
        while let Some(current) = to_visit.pop_front() {
            to_visit.extend(self.children(current).iter().copied());
            subtree.push(current);
        }

        // Anything bound to a removed widget reads 0 from now on.
        for &current in &subtree {
            for slot in LayoutSlot::ALL {
                self.propagate(Dependent::new(current, slot));
            }
        }

        self.unlink(id);
        let mut removed_root_data = None;
        for &current in &subtree {
            self.children.remove(current);
            self.parent.remove(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }

        self.forget(&subtree);
        self.structure_changed();
        removed_root_data
    }

    /// Change the name string bindings use to find `id`.
    pub fn rename(&mut self, id: WidgetId, name: impl Into<String>) -> bool {
        let Some(widget) = self.nodes.get_mut(id) else {
            return false;
        };
        widget.name = name.into();
        self.structure_changed();
        true
    }

    fn unlink(&mut self, node: WidgetId) {
        if let Some(old_parent) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(old_parent) {
                siblings.retain(|&child| child != node);
            }
        }
    }

    /// Names or parent links changed: re-resolve the memoised string paths.
    ///
    /// Only layouts with a path that now leads elsewhere are invalidated.
    /// Everything else keeps its cached value and its edges.
    fn structure_changed(&self) {
        let tracked: Vec<Dependent> = self.resolving.borrow().iter().copied().collect();
        let mut invalidated = 0usize;

        for dependent in &tracked {
            let layout = self
                .nodes
                .get(dependent.widget)
                .map(|widget| widget.layout(dependent.slot))
                .filter(|layout| layout.has_resolutions());
            let Some(layout) = layout else {
                self.resolving.borrow_mut().remove(dependent);
                continue;
            };
            if layout.refresh_resolutions(self, Some(dependent.widget)) {
                self.release(*dependent, layout.take_sources());
                self.propagate(*dependent);
                invalidated += 1;
            }
        }

        trace!(tracked = tracked.len(), invalidated, "tree structure changed, paths re-resolved");
    }

    /// Drop edges and path records that mention removed widgets.
    fn forget(&self, removed: &[WidgetId]) {
        let removed: HashSet<WidgetId> = removed.iter().copied().collect();
        self.dependents.borrow_mut().retain(|source, targets| {
            targets.retain(|target| !removed.contains(&target.widget));
            !removed.contains(&source.widget) && !targets.is_empty()
        });
        self.resolving
            .borrow_mut()
            .retain(|dependent| !removed.contains(&dependent.widget));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.nodes.get(id)
    }

    pub fn name(&self, id: WidgetId) -> Option<&str> {
        self.nodes.get(id).map(Widget::name)
    }

    /// First widget with the given name, anywhere in the arena.
    pub fn find(&self, name: &str) -> Option<WidgetId> {
        self.nodes
            .iter()
            .find(|(_, widget)| !widget.name.is_empty() && self.config.names_match(&widget.name, name))
            .map(|(id, _)| id)
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.parent.get(id).copied()
    }

    /// Children of a widget. Empty if it has none or does not exist.
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors from the immediate parent up to the top-level container.
    pub fn ancestors(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parse a layout string with this tree's config.
    pub fn layout_from_str(&self, input: &str) -> Layout {
        Layout::parse_or_zero(input, &self.config)
    }

    /// Parse a 2-D layout string with this tree's config.
    pub fn layout2d_from_str(&self, input: &str) -> Layout2d {
        Layout2d::parse_or_zero(input, &self.config)
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    pub fn set_position(&mut self, id: WidgetId, position: impl IntoLayout2d) -> bool {
        let position = position.into_layout2d(&self.config);
        self.set_layout(id, LayoutSlot::PositionX, position.x)
            && self.set_layout(id, LayoutSlot::PositionY, position.y)
    }

    pub fn set_position_xy(&mut self, id: WidgetId, x: impl IntoLayout, y: impl IntoLayout) -> bool {
        self.set_layout(id, LayoutSlot::PositionX, x) && self.set_layout(id, LayoutSlot::PositionY, y)
    }

    pub fn set_x(&mut self, id: WidgetId, x: impl IntoLayout) -> bool {
        self.set_layout(id, LayoutSlot::PositionX, x)
    }

    pub fn set_y(&mut self, id: WidgetId, y: impl IntoLayout) -> bool {
        self.set_layout(id, LayoutSlot::PositionY, y)
    }

    pub fn set_size(&mut self, id: WidgetId, size: impl IntoLayout2d) -> bool {
        let size = size.into_layout2d(&self.config);
        self.set_layout(id, LayoutSlot::Width, size.x) && self.set_layout(id, LayoutSlot::Height, size.y)
    }

    pub fn set_size_wh(&mut self, id: WidgetId, width: impl IntoLayout, height: impl IntoLayout) -> bool {
        self.set_layout(id, LayoutSlot::Width, width) && self.set_layout(id, LayoutSlot::Height, height)
    }

    pub fn set_width(&mut self, id: WidgetId, width: impl IntoLayout) -> bool {
        self.set_layout(id, LayoutSlot::Width, width)
    }

    pub fn set_height(&mut self, id: WidgetId, height: impl IntoLayout) -> bool {
        self.set_layout(id, LayoutSlot::Height, height)
    }

    /// Change the padding, and with it the inner size children bind to.
    pub fn set_padding(&mut self, id: WidgetId, padding: Spacing) -> bool {
        let Some(widget) = self.nodes.get_mut(id) else {
            return false;
        };
        widget.padding = padding;
        self.propagate(Dependent::new(id, LayoutSlot::Width));
        self.propagate(Dependent::new(id, LayoutSlot::Height));
        true
    }

    /// Store `layout` in `slot` of `id` and invalidate everything bound to it.
    pub fn set_layout(&mut self, id: WidgetId, slot: LayoutSlot, layout: impl IntoLayout) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        // Seed with the current value so a binding cycle through `id` sees it.
        let seed = self.slot_value(id, slot);
        let layout = layout.into_layout(&self.config);
        layout.attach(slot.axis(), seed);
        let Some(widget) = self.nodes.get_mut(id) else {
            return false;
        };
        let previous = std::mem::replace(widget.layout_mut(slot), layout);

        let changed = Dependent::new(id, slot);
        self.release(changed, previous.take_sources());
        self.propagate(changed);
        true
    }

    /// Drop the edges `dependent` registered with `sources`.
    fn release(&self, dependent: Dependent, sources: HashSet<Dependent>) {
        let mut dependents = self.dependents.borrow_mut();
        for source in sources {
            if let Some(set) = dependents.get_mut(&source) {
                set.remove(&dependent);
                if set.is_empty() {
                    dependents.remove(&source);
                }
            }
        }
    }

    /// Mark every layout that transitively read `changed` dirty.
    ///
    /// The walk does not continue past layouts that were already dirty.
    fn propagate(&self, changed: Dependent) {
        let mut stack = vec![changed];
        let mut invalidated = 0usize;

        while let Some(source) = stack.pop() {
            let targets: Vec<Dependent> = self
                .dependents
                .borrow()
                .get(&source)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();

            for target in targets {
                let Some(widget) = self.nodes.get(target.widget) else {
                    continue;
                };
                if widget.layout(target.slot).mark_dirty() {
                    invalidated += 1;
                    stack.push(target);
                }
            }
        }

        trace!(?changed, invalidated, "propagated layout change");
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    /// Current value of one layout slot, recomputed if dirty.
    pub fn slot_value(&self, id: WidgetId, slot: LayoutSlot) -> f64 {
        let Some(widget) = self.nodes.get(id) else {
            return 0.0;
        };
        let layout = widget.layout(slot);
        let dependent = Dependent::new(id, slot);
        let value = layout.value_in(self, Some(id), Some(dependent));
        if layout.has_resolutions() {
            self.resolving.borrow_mut().insert(dependent);
        }
        value
    }

    pub fn left(&self, id: WidgetId) -> f64 {
        self.slot_value(id, LayoutSlot::PositionX)
    }

    pub fn top(&self, id: WidgetId) -> f64 {
        self.slot_value(id, LayoutSlot::PositionY)
    }

    pub fn width(&self, id: WidgetId) -> f64 {
        self.slot_value(id, LayoutSlot::Width)
    }

    pub fn height(&self, id: WidgetId) -> f64 {
        self.slot_value(id, LayoutSlot::Height)
    }

    pub fn right(&self, id: WidgetId) -> f64 {
        self.left(id) + self.width(id)
    }

    pub fn bottom(&self, id: WidgetId) -> f64 {
        self.top(id) + self.height(id)
    }

    /// Position relative to the parent's inner area.
    pub fn position(&self, id: WidgetId) -> Vector2 {
        Vector2::new(self.left(id), self.top(id))
    }

    pub fn size(&self, id: WidgetId) -> Vector2 {
        Vector2::new(self.width(id), self.height(id))
    }

    /// Size minus padding. May be negative.
    pub fn inner_size(&self, id: WidgetId) -> Vector2 {
        let padding = self.nodes.get(id).map(Widget::padding).unwrap_or_default();
        padding.shrink(self.size(id))
    }

    /// Position relative to the top-level container, including parent padding.
    pub fn absolute_position(&self, id: WidgetId) -> Vector2 {
        let mut position = self.position(id);
        for ancestor in self.ancestors(id) {
            let padding = self.nodes.get(ancestor).map(Widget::padding).unwrap_or_default();
            position += self.position(ancestor) + Vector2::new(padding.left, padding.top);
        }
        position
    }

    /// Evaluate a layout that belongs to no widget, as seen from `owner`.
    ///
    /// Nothing is cached and no dependency is recorded.
    pub fn evaluate(&self, layout: &Layout, owner: Option<WidgetId>) -> f64 {
        layout.evaluate_uncached(self, owner)
    }

    pub fn evaluate_2d(&self, layout: &Layout2d, owner: Option<WidgetId>) -> Vector2 {
        Vector2::new(self.evaluate(&layout.x, owner), self.evaluate(&layout.y, owner))
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Render a layout to a string, naming widgets bound by id.
    pub fn layout_to_string(&self, layout: &Layout) -> Option<String> {
        let name_of = |id: WidgetId| {
            self.name(id)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
        };
        to_expression_string(layout.expr(), &name_of)
    }

    /// `"{x, y}"` for the position of `id`.
    pub fn position_string(&self, id: WidgetId) -> Option<String> {
        let widget = self.nodes.get(id)?;
        self.layout2d_to_string(&widget.position)
    }

    /// `"{w, h}"` for the size of `id`.
    pub fn size_string(&self, id: WidgetId) -> Option<String> {
        let widget = self.nodes.get(id)?;
        self.layout2d_to_string(&widget.size)
    }

    fn layout2d_to_string(&self, layout: &Layout2d) -> Option<String> {
        let x = self.layout_to_string(&layout.x)?;
        let y = self.layout_to_string(&layout.y)?;
        Some(format!("{{{x}, {y}}}"))
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// LayoutHost
// ---------------------------------------------------------------------------

impl LayoutHost for WidgetTree {
    fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.parent.get(id).copied()
    }

    fn children(&self, id: WidgetId) -> &[WidgetId] {
        WidgetTree::children(self, id)
    }

    fn name(&self, id: WidgetId) -> Option<&str> {
        WidgetTree::name(self, id)
    }

    fn read(&self, id: WidgetId, property: Property) -> f64 {
        match property {
            Property::Left | Property::Position => self.left(id),
            Property::Top => self.top(id),
            Property::Width | Property::Size => self.width(id),
            Property::Height => self.height(id),
            Property::Right => self.right(id),
            Property::Bottom => self.bottom(id),
            Property::InnerWidth | Property::InnerSize => self.inner_size(id).x,
            Property::InnerHeight => self.inner_size(id).y,
        }
    }

    fn track(&self, source: Dependent, dependent: Dependent) {
        self.dependents
            .borrow_mut()
            .entry(source)
            .or_default()
            .insert(dependent);
    }
}
