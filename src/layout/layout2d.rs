//! Two-dimensional layout: an x and a y [`Layout`].

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign};
use std::rc::Rc;

use tracing::warn;

use crate::config::LayoutConfig;
use crate::error::ParseError;
use crate::expr::ast::{BinaryOp, Expr};
use crate::expr::parser::parse_layout2d;
use crate::geometry::{Axis, Vector2};
use crate::layout::Layout;

/// A position or size: one [`Layout`] per axis, each cached separately.
#[derive(Debug, Clone)]
pub struct Layout2d {
    pub x: Layout,
    pub y: Layout,
}

impl Default for Layout2d {
    fn default() -> Self {
        Layout2d::new(0.0, 0.0)
    }
}

impl Layout2d {
    /// Combine two 1-D layouts. `x` is put on the x axis and `y` on the y axis.
    pub fn new(x: impl Into<Layout>, y: impl Into<Layout>) -> Self {
        let (x, y) = (x.into(), y.into());
        x.set_axis(Axis::X);
        y.set_axis(Axis::Y);
        Self { x, y }
    }

    /// Parse a 2-D layout string (`"{&.w - 20, &.h}"`, `"b1.size"`, `"5"`).
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let (x, y) = parse_layout2d(input)?;
        Ok(Layout2d::new(Layout::from_rc(x), Layout::from_rc(y)))
    }

    /// Parse a 2-D layout string, degrading to `{0, 0}` on error.
    pub fn parse_or_zero(input: &str, config: &LayoutConfig) -> Self {
        match Layout2d::parse(input) {
            Ok(layout) => layout,
            Err(err) => {
                if config.warn_on_parse_failure {
                    warn!(%err, input, "invalid 2-D layout expression, using {{0, 0}}");
                }
                Layout2d::default()
            }
        }
    }

    /// Value outside any widget tree.
    pub fn value(&self) -> Vector2 {
        Vector2::new(self.x.value(), self.y.value())
    }

    /// Whether both components share their trees with `other`.
    pub fn ptr_eq(&self, other: &Layout2d) -> bool {
        self.x.ptr_eq(&other.x) && self.y.ptr_eq(&other.y)
    }

    /// `"{x, y}"`, or `None` if either component cannot be rendered.
    pub fn to_expression_string(&self) -> Option<String> {
        let x = self.x.to_expression_string()?;
        let y = self.y.to_expression_string()?;
        Some(format!("{{{x}, {y}}}"))
    }

    /// `1` when both components are equal.
    pub fn equal(&self, rhs: impl Into<Layout2d>) -> Layout {
        self.aggregate(BinaryOp::Eq, BinaryOp::And, &rhs.into())
    }

    /// `1` when either component differs.
    pub fn not_equal(&self, rhs: impl Into<Layout2d>) -> Layout {
        self.aggregate(BinaryOp::Ne, BinaryOp::Or, &rhs.into())
    }

    fn aggregate(&self, cmp: BinaryOp, join: BinaryOp, rhs: &Layout2d) -> Layout {
        let xs = Expr::binary(cmp, self.x.axis_fixed_expr(), rhs.x.axis_fixed_expr());
        let ys = Expr::binary(cmp, self.y.axis_fixed_expr(), rhs.y.axis_fixed_expr());
        Layout::join(join, Rc::new(xs), Rc::new(ys), Axis::X)
    }

    /// Apply `op` to each component with the same scalar on the right.
    fn scale(&self, op: BinaryOp, scalar: &Layout) -> Layout2d {
        Layout2d::new(
            Layout::join(op, Rc::clone(self.x.expr_rc()), Rc::clone(scalar.expr_rc()), Axis::X),
            Layout::join(op, Rc::clone(self.y.expr_rc()), Rc::clone(scalar.expr_rc()), Axis::Y),
        )
    }

    /// Apply `op` to each component with the same scalar on the left.
    fn scale_left(scalar: &Layout, op: BinaryOp, rhs: &Layout2d) -> Layout2d {
        Layout2d::new(
            Layout::join(op, Rc::clone(scalar.expr_rc()), Rc::clone(rhs.x.expr_rc()), Axis::X),
            Layout::join(op, Rc::clone(scalar.expr_rc()), Rc::clone(rhs.y.expr_rc()), Axis::Y),
        )
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<Vector2> for Layout2d {
    fn from(v: Vector2) -> Self {
        Layout2d::new(v.x, v.y)
    }
}

impl From<(f64, f64)> for Layout2d {
    fn from((x, y): (f64, f64)) -> Self {
        Layout2d::new(x, y)
    }
}

impl From<(Layout, Layout)> for Layout2d {
    fn from((x, y): (Layout, Layout)) -> Self {
        Layout2d::new(x, y)
    }
}

impl From<&str> for Layout2d {
    fn from(input: &str) -> Self {
        Layout2d::parse_or_zero(input, &LayoutConfig::default())
    }
}

impl From<String> for Layout2d {
    fn from(input: String) -> Self {
        Layout2d::from(input.as_str())
    }
}

impl From<&Layout2d> for Layout2d {
    fn from(layout: &Layout2d) -> Self {
        layout.clone()
    }
}

/// 2-D counterpart of [`IntoLayout`](crate::layout::IntoLayout): strings parse with the tree's config.
pub trait IntoLayout2d {
    fn into_layout2d(self, config: &LayoutConfig) -> Layout2d;
}

macro_rules! into_layout2d_from {
    ($($ty:ty),*) => {
        $(
            impl IntoLayout2d for $ty {
                fn into_layout2d(self, _config: &LayoutConfig) -> Layout2d {
                    Layout2d::from(self)
                }
            }
        )*
    };
}

into_layout2d_from!(Layout2d, &Layout2d, Vector2, (f64, f64), (Layout, Layout));

impl IntoLayout2d for &str {
    fn into_layout2d(self, config: &LayoutConfig) -> Layout2d {
        Layout2d::parse_or_zero(self, config)
    }
}

impl IntoLayout2d for String {
    fn into_layout2d(self, config: &LayoutConfig) -> Layout2d {
        Layout2d::parse_or_zero(&self, config)
    }
}

impl IntoLayout2d for &String {
    fn into_layout2d(self, config: &LayoutConfig) -> Layout2d {
        Layout2d::parse_or_zero(self, config)
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

macro_rules! layout2d_componentwise_op {
    ($op_trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident) => {
        impl<T: Into<Layout2d>> $op_trait<T> for Layout2d {
            type Output = Layout2d;
            fn $method(self, rhs: T) -> Layout2d {
                (&self).$method(rhs)
            }
        }

        impl<T: Into<Layout2d>> $op_trait<T> for &Layout2d {
            type Output = Layout2d;
            fn $method(self, rhs: T) -> Layout2d {
                let rhs = rhs.into();
                Layout2d::new((&self.x).$method(&rhs.x), (&self.y).$method(&rhs.y))
            }
        }

        impl<T: Into<Layout2d>> $assign_trait<T> for Layout2d {
            fn $assign_method(&mut self, rhs: T) {
                *self = (&*self).$method(rhs);
            }
        }
    };
}

layout2d_componentwise_op!(Add, add, AddAssign, add_assign);
layout2d_componentwise_op!(Sub, sub, SubAssign, sub_assign);

macro_rules! layout2d_scalar_op {
    ($op_trait:ident, $method:ident, $assign_trait:ident, $assign_method:ident, $op:expr) => {
        impl<T: Into<Layout>> $op_trait<T> for Layout2d {
            type Output = Layout2d;
            fn $method(self, rhs: T) -> Layout2d {
                self.scale($op, &rhs.into())
            }
        }

        impl<T: Into<Layout>> $op_trait<T> for &Layout2d {
            type Output = Layout2d;
            fn $method(self, rhs: T) -> Layout2d {
                self.scale($op, &rhs.into())
            }
        }

        impl<T: Into<Layout>> $assign_trait<T> for Layout2d {
            fn $assign_method(&mut self, rhs: T) {
                *self = self.scale($op, &rhs.into());
            }
        }
    };
}

layout2d_scalar_op!(Mul, mul, MulAssign, mul_assign, BinaryOp::Mul);
layout2d_scalar_op!(Div, div, DivAssign, div_assign, BinaryOp::Div);
layout2d_scalar_op!(Rem, rem, RemAssign, rem_assign, BinaryOp::Rem);

impl Mul<Layout2d> for f64 {
    type Output = Layout2d;
    fn mul(self, rhs: Layout2d) -> Layout2d {
        Layout2d::scale_left(&Layout::from(self), BinaryOp::Mul, &rhs)
    }
}

impl Mul<&Layout2d> for f64 {
    type Output = Layout2d;
    fn mul(self, rhs: &Layout2d) -> Layout2d {
        Layout2d::scale_left(&Layout::from(self), BinaryOp::Mul, rhs)
    }
}

impl Neg for Layout2d {
    type Output = Layout2d;
    fn neg(self) -> Layout2d {
        -&self
    }
}

impl Neg for &Layout2d {
    type Output = Layout2d;
    fn neg(self) -> Layout2d {
        Layout2d::new(-&self.x, -&self.y)
    }
}
