//! Bind helpers: layouts that follow another widget's geometry.
//!
//! ```
//! use tgui_layout::{bind_right, WidgetTree};
//!
//! let mut tree = WidgetTree::new();
//! let root = tree.insert_root();
//! let b1 = tree.add(root, "b1");
//! let b2 = tree.add(root, "b2");
//! tree.set_position_xy(b1, 10, 0);
//! tree.set_width(b1, 40);
//! tree.set_x(b2, bind_right(b1) + 5.0);
//! assert_eq!(tree.left(b2), 55.0);
//! ```

use std::rc::Rc;

use crate::expr::ast::{BindingRef, Expr, Function, Property};
use crate::layout::{Layout, Layout2d};
use crate::widget::node::WidgetId;

fn bind(id: WidgetId, property: Property) -> Layout {
    Layout::from_expr(Expr::Binding(BindingRef::widget(id, property)))
}

/// Left edge of `id` (its x position).
pub fn bind_left(id: WidgetId) -> Layout {
    bind(id, Property::Left)
}

/// Top edge of `id` (its y position).
pub fn bind_top(id: WidgetId) -> Layout {
    bind(id, Property::Top)
}

/// Same as [`bind_left`].
pub fn bind_pos_x(id: WidgetId) -> Layout {
    bind_left(id)
}

/// Same as [`bind_top`].
pub fn bind_pos_y(id: WidgetId) -> Layout {
    bind_top(id)
}

pub fn bind_width(id: WidgetId) -> Layout {
    bind(id, Property::Width)
}

pub fn bind_height(id: WidgetId) -> Layout {
    bind(id, Property::Height)
}

/// Right edge: left + width.
pub fn bind_right(id: WidgetId) -> Layout {
    bind(id, Property::Right)
}

/// Bottom edge: top + height.
pub fn bind_bottom(id: WidgetId) -> Layout {
    bind(id, Property::Bottom)
}

/// Width minus horizontal padding.
pub fn bind_inner_width(id: WidgetId) -> Layout {
    bind(id, Property::InnerWidth)
}

/// Height minus vertical padding.
pub fn bind_inner_height(id: WidgetId) -> Layout {
    bind(id, Property::InnerHeight)
}

pub fn bind_position(id: WidgetId) -> Layout2d {
    Layout2d::new(bind_left(id), bind_top(id))
}

pub fn bind_size(id: WidgetId) -> Layout2d {
    Layout2d::new(bind_width(id), bind_height(id))
}

pub fn bind_inner_size(id: WidgetId) -> Layout2d {
    Layout2d::new(bind_inner_width(id), bind_inner_height(id))
}

/// The smaller of two layouts.
pub fn bind_min(a: impl Into<Layout>, b: impl Into<Layout>) -> Layout {
    call(Function::Min, &[a.into(), b.into()])
}

/// The larger of two layouts.
pub fn bind_max(a: impl Into<Layout>, b: impl Into<Layout>) -> Layout {
    call(Function::Max, &[a.into(), b.into()])
}

/// `value` clamped into `[min, max]`.
pub fn bind_range(min: impl Into<Layout>, max: impl Into<Layout>, value: impl Into<Layout>) -> Layout {
    call(Function::Range, &[min.into(), max.into(), value.into()])
}

/// `then` while `cond` is non-zero, `otherwise` when it is zero.
pub fn bind_if(cond: impl Into<Layout>, then: impl Into<Layout>, otherwise: impl Into<Layout>) -> Layout {
    let (cond, then, otherwise) = (cond.into(), then.into(), otherwise.into());
    let axis = then.axis();
    Layout::on_axis(
        Rc::new(Expr::Conditional {
            cond: Rc::clone(cond.expr_rc()),
            then_branch: Rc::clone(then.expr_rc()),
            else_branch: Rc::clone(otherwise.expr_rc()),
        }),
        axis,
    )
}

/// Component-wise [`bind_if`] with a shared condition.
pub fn bind_if_2d(cond: impl Into<Layout>, then: impl Into<Layout2d>, otherwise: impl Into<Layout2d>) -> Layout2d {
    let (cond, then, otherwise) = (cond.into(), then.into(), otherwise.into());
    Layout2d::new(
        bind_if(&cond, then.x, otherwise.x),
        bind_if(&cond, then.y, otherwise.y),
    )
}

/// Parse a layout string; same as `Layout::from`.
pub fn bind_str(expression: &str) -> Layout {
    Layout::from(expression)
}

/// Parse a 2-D layout string; same as `Layout2d::from`.
pub fn bind_str_2d(expression: &str) -> Layout2d {
    Layout2d::from(expression)
}

fn call(func: Function, args: &[Layout]) -> Layout {
    let axis = args.first().map(Layout::axis).unwrap_or_default();
    Layout::on_axis(
        Rc::new(Expr::Call {
            func,
            args: args.iter().map(|a| Rc::clone(a.expr_rc())).collect(),
        }),
        axis,
    )
}
