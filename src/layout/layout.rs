//! One-dimensional layout: a shared expression tree plus a value cache.
//!
//! A [`Layout`] is what a widget stores for each of its x, y, width and height.
//! It is built from a number, a string, a bind helper or by combining other
//! layouts with operators:
//!
//! ```
//! use tgui_layout::Layout;
//!
//! let layout = Layout::from("50 + 20") * 2.0;
//! assert_eq!(layout.value(), 140.0);
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign};
use std::rc::Rc;

use tracing::warn;

use crate::config::LayoutConfig;
use crate::error::ParseError;
use crate::expr::ast::{BinaryOp, Expr, UnaryOp};
use crate::expr::eval::Evaluator;
use crate::expr::format::to_expression_string;
use crate::expr::parser::parse_layout;
use crate::geometry::Axis;
use crate::layout::resolve::{Detached, LayoutHost, ResolutionCache};
use crate::widget::node::{Dependent, WidgetId};

// ---------------------------------------------------------------------------
// Cache state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct CacheState {
    value: Cell<f64>,
    dirty: Cell<bool>,
    /// Set while the tree is being evaluated; re-entry returns `value`.
    evaluating: Cell<bool>,
    resolutions: ResolutionCache,
    sources: RefCell<HashSet<Dependent>>,
}

impl CacheState {
    fn dirty() -> Self {
        Self {
            value: Cell::new(0.0),
            dirty: Cell::new(true),
            evaluating: Cell::new(false),
            resolutions: ResolutionCache::default(),
            sources: RefCell::new(HashSet::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A 1-D layout value (position or size component).
///
/// Cloning shares the expression tree and copies the cache; the two copies
/// then evolve independently.
#[derive(Debug, Clone)]
pub struct Layout {
    expr: Rc<Expr>,
    axis: Cell<Axis>,
    state: CacheState,
}

impl Default for Layout {
    fn default() -> Self {
        Layout::constant(0.0)
    }
}

impl Layout {
    /// A constant layout.
    pub fn constant(value: f64) -> Self {
        let layout = Layout::from_rc(Rc::new(Expr::Constant(value)));
        layout.state.value.set(value);
        layout.state.dirty.set(false);
        layout
    }

    /// Wrap an expression tree.
    pub fn from_expr(expr: Expr) -> Self {
        Layout::from_rc(Rc::new(expr))
    }

    pub(crate) fn from_rc(expr: Rc<Expr>) -> Self {
        Self {
            expr,
            axis: Cell::new(Axis::X),
            state: CacheState::dirty(),
        }
    }

    /// Parse a layout string, reporting errors.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_layout(input).map(Layout::from_rc)
    }

    /// Parse a layout string, degrading to `0` on error.
    pub fn parse_or_zero(input: &str, config: &LayoutConfig) -> Self {
        match Layout::parse(input) {
            Ok(layout) => layout,
            Err(err) => {
                if config.warn_on_parse_failure {
                    warn!(%err, input, "invalid layout expression, using 0");
                }
                Layout::default()
            }
        }
    }

    /// Build from UTF-16 text. Unpaired surrogates become U+FFFD.
    pub fn from_utf16(units: &[u16]) -> Self {
        Layout::from(String::from_utf16_lossy(units))
    }

    /// Build from a sequence of code points.
    pub fn from_chars(chars: &[char]) -> Self {
        Layout::from(chars.iter().collect::<String>())
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn axis(&self) -> Axis {
        self.axis.get()
    }

    /// Set the axis used by bindings to 2-D properties (`"b1.size"`).
    pub fn set_axis(&self, axis: Axis) {
        if self.axis.replace(axis) != axis {
            self.state.dirty.set(true);
        }
    }

    /// Whether both layouts share the same expression tree.
    pub fn ptr_eq(&self, other: &Layout) -> bool {
        Rc::ptr_eq(&self.expr, &other.expr)
    }

    pub fn is_constant(&self) -> bool {
        matches!(*self.expr, Expr::Constant(_))
    }

    /// Value outside any widget tree: every binding reads as `0`.
    pub fn value(&self) -> f64 {
        self.value_in(&Detached::default(), None, None)
    }

    /// Last computed value, without recomputing.
    pub fn cached_value(&self) -> f64 {
        self.state.value.get()
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty.get()
    }

    /// Render back to a layout string. Bindings to specific widgets have no
    /// name here and give `None`; see `WidgetTree::layout_to_string`.
    pub fn to_expression_string(&self) -> Option<String> {
        to_expression_string(&self.expr, &|_| None)
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Cached value as seen from `owner` in `host`.
    ///
    /// Recomputes only when dirty. A layout re-entered while it is being
    /// computed (a binding cycle) answers with its previous value.
    pub(crate) fn value_in(
        &self,
        host: &dyn LayoutHost,
        owner: Option<WidgetId>,
        dependent: Option<Dependent>,
    ) -> f64 {
        let state = &self.state;
        if state.evaluating.get() || !state.dirty.get() {
            return state.value.get();
        }

        state.evaluating.set(true);
        let value = Evaluator {
            host,
            owner,
            dependent,
            axis: self.axis.get(),
            resolutions: &state.resolutions,
            sources: &state.sources,
        }
        .eval(&self.expr);
        state.evaluating.set(false);

        state.value.set(value);
        state.dirty.set(false);
        value
    }

    /// Evaluate from `owner` without touching the cache or recording edges.
    pub(crate) fn evaluate_uncached(&self, host: &dyn LayoutHost, owner: Option<WidgetId>) -> f64 {
        let resolutions = ResolutionCache::default();
        let sources = RefCell::new(HashSet::new());
        Evaluator {
            host,
            owner,
            dependent: None,
            axis: self.axis.get(),
            resolutions: &resolutions,
            sources: &sources,
        }
        .eval(&self.expr)
    }

    /// Mark dirty. Returns `true` if the layout was clean before.
    pub(crate) fn mark_dirty(&self) -> bool {
        !self.state.dirty.replace(true)
    }

    /// Whether the last evaluation memoised any string path.
    pub(crate) fn has_resolutions(&self) -> bool {
        !self.state.resolutions.is_empty()
    }

    /// Re-resolve memoised paths from `owner` after a structural change.
    ///
    /// Marks the layout dirty and returns `true` if any path now leads to a
    /// different widget.
    pub(crate) fn refresh_resolutions(&self, host: &dyn LayoutHost, owner: Option<WidgetId>) -> bool {
        let changed = self.state.resolutions.refresh(host, owner);
        if changed {
            self.state.dirty.set(true);
        }
        changed
    }

    /// Prepare a layout that is being stored into a widget slot.
    ///
    /// The cache starts from `seed`, the value of the layout it replaces.
    pub(crate) fn attach(&self, axis: Axis, seed: f64) {
        self.axis.set(axis);
        self.state.value.set(seed);
        self.state.dirty.set(true);
        self.state.evaluating.set(false);
        self.state.resolutions.clear();
        self.state.sources.borrow_mut().clear();
    }

    /// Source slots this layout registered edges with.
    pub(crate) fn take_sources(&self) -> HashSet<Dependent> {
        std::mem::take(&mut *self.state.sources.borrow_mut())
    }

    // -----------------------------------------------------------------------
    // Composition
    // -----------------------------------------------------------------------

    pub(crate) fn expr_rc(&self) -> &Rc<Expr> {
        &self.expr
    }

    /// The tree with this layout's axis fixed on every 2-D binding, for use
    /// inside a layout on another axis.
    pub(crate) fn axis_fixed_expr(&self) -> Rc<Expr> {
        self.expr.fix_axis(self.axis())
    }

    /// `self <op> rhs`, keeping the axis of `self`.
    pub(crate) fn combine(op: BinaryOp, left: &Layout, right: &Layout) -> Layout {
        let right_expr = if right.axis() == left.axis() {
            Rc::clone(&right.expr)
        } else {
            right.axis_fixed_expr()
        };
        Layout::join(op, Rc::clone(&left.expr), right_expr, left.axis())
    }

    /// `left <op> right` as-is: 2-D bindings on either side follow `axis`.
    pub(crate) fn join(op: BinaryOp, left: Rc<Expr>, right: Rc<Expr>, axis: Axis) -> Layout {
        let joined = Layout::from_expr(Expr::binary(op, left, right));
        joined.axis.set(axis);
        joined
    }

    /// Wrap a tree on a given axis.
    pub(crate) fn on_axis(expr: Rc<Expr>, axis: Axis) -> Layout {
        let layout = Layout::from_rc(expr);
        layout.axis.set(axis);
        layout
    }

    pub fn equal(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Eq, self, &rhs.into())
    }

    pub fn not_equal(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Ne, self, &rhs.into())
    }

    pub fn less(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Lt, self, &rhs.into())
    }

    pub fn less_eq(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Le, self, &rhs.into())
    }

    pub fn greater(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Gt, self, &rhs.into())
    }

    pub fn greater_eq(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Ge, self, &rhs.into())
    }

    pub fn and(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::And, self, &rhs.into())
    }

    pub fn or(&self, rhs: impl Into<Layout>) -> Layout {
        Layout::combine(BinaryOp::Or, self, &rhs.into())
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<f64> for Layout {
    fn from(value: f64) -> Self {
        Layout::constant(value)
    }
}

impl From<f32> for Layout {
    fn from(value: f32) -> Self {
        Layout::constant(f64::from(value))
    }
}

impl From<i32> for Layout {
    fn from(value: i32) -> Self {
        Layout::constant(f64::from(value))
    }
}

impl From<&str> for Layout {
    fn from(input: &str) -> Self {
        Layout::parse_or_zero(input, &LayoutConfig::default())
    }
}

impl From<String> for Layout {
    fn from(input: String) -> Self {
        Layout::from(input.as_str())
    }
}

impl From<&String> for Layout {
    fn from(input: &String) -> Self {
        Layout::from(input.as_str())
    }
}

impl From<&Layout> for Layout {
    fn from(layout: &Layout) -> Self {
        layout.clone()
    }
}

/// Conversion used by the [`WidgetTree`](crate::WidgetTree) setters.
///
/// Strings are parsed with the tree's [`LayoutConfig`], so its warning setting
/// applies. Everything else converts exactly like [`From`].
pub trait IntoLayout {
    fn into_layout(self, config: &LayoutConfig) -> Layout;
}

impl IntoLayout for Layout {
    fn into_layout(self, _config: &LayoutConfig) -> Layout {
        self
    }
}

impl IntoLayout for &Layout {
    fn into_layout(self, _config: &LayoutConfig) -> Layout {
        self.clone()
    }
}

macro_rules! into_layout_from {
    ($($ty:ty),*) => {
        $(
            impl IntoLayout for $ty {
                fn into_layout(self, _config: &LayoutConfig) -> Layout {
                    Layout::from(self)
                }
            }
        )*
    };
}

into_layout_from!(f64, f32, i32);

impl IntoLayout for &str {
    fn into_layout(self, config: &LayoutConfig) -> Layout {
        Layout::parse_or_zero(self, config)
    }
}

impl IntoLayout for String {
    fn into_layout(self, config: &LayoutConfig) -> Layout {
        Layout::parse_or_zero(&self, config)
    }
}

impl IntoLayout for &String {
    fn into_layout(self, config: &LayoutConfig) -> Layout {
        Layout::parse_or_zero(self, config)
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

macro_rules! layout_binary_op {
    ($op_trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl<T: Into<Layout>> $op_trait<T> for Layout {
            type Output = Layout;
            fn $method(self, rhs: T) -> Layout {
                Layout::combine($op, &self, &rhs.into())
            }
        }

        impl<T: Into<Layout>> $op_trait<T> for &Layout {
            type Output = Layout;
            fn $method(self, rhs: T) -> Layout {
                Layout::combine($op, self, &rhs.into())
            }
        }

        impl $op_trait<Layout> for f64 {
            type Output = Layout;
            fn $method(self, rhs: Layout) -> Layout {
                let lhs = Layout::constant(self);
                lhs.axis.set(rhs.axis());
                Layout::combine($op, &lhs, &rhs)
            }
        }

        impl $op_trait<&Layout> for f64 {
            type Output = Layout;
            fn $method(self, rhs: &Layout) -> Layout {
                let lhs = Layout::constant(self);
                lhs.axis.set(rhs.axis());
                Layout::combine($op, &lhs, rhs)
            }
        }

        impl<T: Into<Layout>> $assign_trait<T> for Layout {
            fn $assign_method(&mut self, rhs: T) {
                *self = Layout::combine($op, self, &rhs.into());
            }
        }
    };
}

layout_binary_op!(Add, add, AddAssign, add_assign, BinaryOp::Add);
layout_binary_op!(Sub, sub, SubAssign, sub_assign, BinaryOp::Sub);
layout_binary_op!(Mul, mul, MulAssign, mul_assign, BinaryOp::Mul);
layout_binary_op!(Div, div, DivAssign, div_assign, BinaryOp::Div);
layout_binary_op!(Rem, rem, RemAssign, rem_assign, BinaryOp::Rem);

impl Neg for Layout {
    type Output = Layout;
    fn neg(self) -> Layout {
        -&self
    }
}

impl Neg for &Layout {
    type Output = Layout;
    fn neg(self) -> Layout {
        let negated = Layout::from_expr(Expr::Unary {
            op: UnaryOp::Minus,
            child: Rc::clone(&self.expr),
        });
        negated.axis.set(self.axis());
        negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn constants() {
        assert_eq!(Layout::default().value(), 0.0);
        assert_eq!(Layout::from(5).value(), 5.0);
        assert_eq!(Layout::from(-20.3).value(), -20.3);
        assert_eq!(Layout::from(2.5f32).value(), 2.5);
        assert!(Layout::from(3.0).is_constant());
        assert!(!Layout::from(3.0).is_dirty());
    }

    #[test]
    fn strings() {
        assert_eq!(Layout::from("").value(), 0.0);
        assert_eq!(Layout::from("  12.5  ").value(), 12.5);
        assert_eq!(Layout::from(String::from("3 * 4")).value(), 12.0);
        assert_eq!(Layout::from("min(6, 2)").value(), 2.0);
    }

    #[test]
    fn malformed_strings_are_zero() {
        for input in ["{3, 2}", "(5", "6)", "xyz", "[1, 2]", "{3}", "1 ? 2", "if 1 then 2", "if 0 else 2"] {
            assert_eq!(Layout::from(input).value(), 0.0, "{input}");
        }
    }

    #[test]
    fn strict_parse_reports_errors() {
        assert!(Layout::parse("(5").is_err());
        assert_eq!(Layout::parse("7").unwrap().value(), 7.0);
    }

    #[test]
    fn silent_config_still_degrades() {
        let config = LayoutConfig::new().with_parse_warnings(false);
        assert_eq!(Layout::parse_or_zero("6)", &config).value(), 0.0);
    }

    #[test]
    fn unicode_inputs() {
        let utf16: Vec<u16> = "2 + 3".encode_utf16().collect();
        assert_eq!(Layout::from_utf16(&utf16).value(), 5.0);
        let chars: Vec<char> = "4 * 2".chars().collect();
        assert_eq!(Layout::from_chars(&chars).value(), 8.0);
    }

    // ── Identity ─────────────────────────────────────────────────────

    #[test]
    fn clone_shares_tree() {
        let a = Layout::from("1 + 2");
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(b.value(), 3.0);

        let mut c = a.clone();
        c += 1.0;
        assert!(!a.ptr_eq(&c));
        assert_eq!(a.value(), 3.0);
        assert_eq!(c.value(), 4.0);
    }

    #[test]
    fn clone_copies_cache_state() {
        let a = Layout::from("1 + 2");
        assert!(a.is_dirty());
        assert_eq!(a.value(), 3.0);
        let b = a.clone();
        assert!(!b.is_dirty());
        assert_eq!(b.cached_value(), 3.0);
    }

    // ── Operators ────────────────────────────────────────────────────

    #[test]
    fn arithmetic_operators() {
        let l1 = Layout::from(7.0);
        let l2 = Layout::from(3.0);
        assert_eq!((&l1 + &l2).value(), 10.0);
        assert_eq!((&l1 - &l2).value(), 4.0);
        assert_eq!((&l1 * &l2).value(), 21.0);
        assert_eq!((&l1 / 2.0).value(), 3.5);
        assert_eq!((&l1 % &l2).value(), 1.0);
        assert_eq!((-&l1).value(), -7.0);
        assert_eq!((2.0 * &l2).value(), 6.0);
        assert_eq!((10.0 - l2.clone()).value(), 7.0);
        assert_eq!((l1 / 0.0).value(), 0.0);
    }

    #[test]
    fn compound_assignment() {
        let mut l = Layout::from(10.0);
        l += 5.0;
        assert_eq!(l.value(), 15.0);
        l -= "3";
        assert_eq!(l.value(), 12.0);
        l *= 2;
        assert_eq!(l.value(), 24.0);
        l /= Layout::from(4.0);
        assert_eq!(l.value(), 6.0);
        l %= 4.0;
        assert_eq!(l.value(), 2.0);
    }

    #[test]
    fn comparison_and_logic() {
        let two = Layout::from(2.0);
        let three = Layout::from(3.0);
        assert_eq!(two.less(&three).value(), 1.0);
        assert_eq!(two.less_eq(2.0).value(), 1.0);
        assert_eq!(two.greater(&three).value(), 0.0);
        assert_eq!(three.greater_eq(4.0).value(), 0.0);
        assert_eq!(two.equal(2.0).value(), 1.0);
        assert_eq!(two.not_equal(2.0).value(), 0.0);
        assert_eq!(two.and(0.0).value(), 0.0);
        assert_eq!(two.or(0.0).value(), 1.0);
    }

    #[test]
    fn combine_keeps_left_axis() {
        let left = Layout::from(1.0);
        left.set_axis(Axis::Y);
        let sum = &left + 2.0;
        assert_eq!(sum.axis(), Axis::Y);
    }

    // ── Caching ──────────────────────────────────────────────────────

    /// Tree host that counts child lookups made during path resolution.
    struct CountingHost<'a> {
        tree: &'a crate::WidgetTree,
        lookups: Cell<usize>,
    }

    impl LayoutHost for CountingHost<'_> {
        fn config(&self) -> &LayoutConfig {
            LayoutHost::config(self.tree)
        }

        fn contains(&self, id: WidgetId) -> bool {
            LayoutHost::contains(self.tree, id)
        }

        fn parent(&self, id: WidgetId) -> Option<WidgetId> {
            LayoutHost::parent(self.tree, id)
        }

        fn children(&self, id: WidgetId) -> &[WidgetId] {
            self.lookups.set(self.lookups.get() + 1);
            LayoutHost::children(self.tree, id)
        }

        fn name(&self, id: WidgetId) -> Option<&str> {
            LayoutHost::name(self.tree, id)
        }

        fn read(&self, id: WidgetId, property: crate::expr::ast::Property) -> f64 {
            self.tree.read(id, property)
        }

        fn track(&self, _source: Dependent, _dependent: Dependent) {}
    }

    #[test]
    fn resolutions_are_memoised_across_evaluations() {
        let mut tree = crate::WidgetTree::new();
        let root = tree.insert_root();
        let b1 = tree.add(root, "b1");
        let b2 = tree.add(root, "b2");
        tree.set_width(b1, 20);

        let host = CountingHost { tree: &tree, lookups: Cell::new(0) };
        let layout = Layout::from("b1.width + 1");
        assert_eq!(layout.value_in(&host, Some(b2), None), 21.0);
        let first = host.lookups.get();
        assert!(first > 0);
        assert!(layout.has_resolutions());

        assert_eq!(layout.value_in(&host, Some(b2), None), 21.0);
        assert!(layout.mark_dirty());
        assert_eq!(layout.value_in(&host, Some(b2), None), 21.0);
        assert_eq!(host.lookups.get(), first);

        assert!(!layout.refresh_resolutions(&host, Some(b2)));
        assert!(!layout.is_dirty());
    }

    // ── Serialization ────────────────────────────────────────────────

    #[test]
    fn expression_strings() {
        assert_eq!(Layout::from("b1.left + 10").to_expression_string().as_deref(), Some("b1.left + 10"));
        assert_eq!(Layout::from(50.0).to_expression_string().as_deref(), Some("50"));
        let combined = Layout::from("20%") + Layout::from("&.x");
        assert_eq!(combined.to_expression_string().as_deref(), Some("20% + &.x"));
    }
}
