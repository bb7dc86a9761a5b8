//! Expression tree: the node types a layout evaluates.
//!
//! Children are reference counted so combining layouts (`a + b`) shares the
//! operand trees instead of copying them. A tree never changes once built.

use std::rc::Rc;

use crate::error::ParseError;
use crate::geometry::Axis;
use crate::widget::node::{LayoutSlot, WidgetId};

// ---------------------------------------------------------------------------
// Operators and functions
// ---------------------------------------------------------------------------

/// Prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Infix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    /// Operator text as it appears in a layout string.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Binding strength, higher binds tighter. Matches the parser's grammar.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::Eq | BinaryOp::Ne => 4,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 7,
        }
    }

    /// `+ - * / %`
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }
}

/// Built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Smallest argument; `min()` is 0.
    Min,
    /// Largest argument; `max()` is 0.
    Max,
    /// `range(lo, hi, v)` clamps `v` into `[lo, hi]`.
    Range,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Function> {
        match name {
            "min" => Some(Function::Min),
            "max" => Some(Function::Max),
            "range" => Some(Function::Range),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Range => "range",
        }
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// A geometry property a binding reads from a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Left,
    Top,
    Width,
    Height,
    Right,
    Bottom,
    InnerWidth,
    InnerHeight,
    /// 2-D: `Left` on the x axis, `Top` on the y axis.
    Position,
    /// 2-D: `Width` / `Height`.
    Size,
    /// 2-D: `InnerWidth` / `InnerHeight`.
    InnerSize,
}

impl Property {
    /// Look up the property selected by the last segment of a binding path.
    pub fn from_name(name: &str) -> Option<Property> {
        let property = match name {
            "x" | "l" | "left" => Property::Left,
            "y" | "t" | "top" => Property::Top,
            "w" | "width" => Property::Width,
            "h" | "height" => Property::Height,
            "r" | "right" => Property::Right,
            "b" | "bottom" => Property::Bottom,
            "iw" | "innerwidth" => Property::InnerWidth,
            "ih" | "innerheight" => Property::InnerHeight,
            "pos" | "position" => Property::Position,
            "size" => Property::Size,
            "innersize" => Property::InnerSize,
            _ => return None,
        };
        Some(property)
    }

    /// Canonical name, as written back by the formatter.
    pub fn name(self) -> &'static str {
        match self {
            Property::Left => "left",
            Property::Top => "top",
            Property::Width => "width",
            Property::Height => "height",
            Property::Right => "right",
            Property::Bottom => "bottom",
            Property::InnerWidth => "innerwidth",
            Property::InnerHeight => "innerheight",
            Property::Position => "position",
            Property::Size => "size",
            Property::InnerSize => "innersize",
        }
    }

    /// Whether the property is two-dimensional.
    pub fn is_vector(self) -> bool {
        matches!(self, Property::Position | Property::Size | Property::InnerSize)
    }

    /// The scalar property read along `axis`. Scalar properties map to themselves.
    pub fn component(self, axis: Axis) -> Property {
        match (self, axis) {
            (Property::Position, Axis::X) => Property::Left,
            (Property::Position, Axis::Y) => Property::Top,
            (Property::Size, Axis::X) => Property::Width,
            (Property::Size, Axis::Y) => Property::Height,
            (Property::InnerSize, Axis::X) => Property::InnerWidth,
            (Property::InnerSize, Axis::Y) => Property::InnerHeight,
            (scalar, _) => scalar,
        }
    }

    /// Layout slots of the source widget whose values a scalar property reads.
    pub fn slots(self) -> &'static [LayoutSlot] {
        match self {
            Property::Left | Property::Position => &[LayoutSlot::PositionX],
            Property::Top => &[LayoutSlot::PositionY],
            Property::Width | Property::InnerWidth | Property::Size | Property::InnerSize => {
                &[LayoutSlot::Width]
            }
            Property::Height | Property::InnerHeight => &[LayoutSlot::Height],
            Property::Right => &[LayoutSlot::PositionX, LayoutSlot::Width],
            Property::Bottom => &[LayoutSlot::PositionY, LayoutSlot::Height],
        }
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// One navigation step of a binding path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// `&` or `parent`: move to the container.
    Parent,
    /// A widget name, looked up among children and then siblings.
    Name(String),
}

/// What a binding points at.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingTarget {
    /// A specific widget, from the `bind_*` helpers.
    Widget(WidgetId),
    /// A symbolic path resolved relative to the owning widget, from a string.
    ///
    /// `field` is the trailing segment as written; an empty `segments` list
    /// refers to the owner itself (`"width"`).
    Path { segments: Vec<Segment>, field: String },
}

/// A reference to another widget's geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingRef {
    pub target: BindingTarget,
    /// `None` when the trailing segment names no known property.
    pub property: Option<Property>,
    /// Fixed axis for 2-D properties. `None` follows the containing layout.
    pub axis: Option<Axis>,
}

impl BindingRef {
    /// Binding to a property of a specific widget.
    pub fn widget(id: WidgetId, property: Property) -> Self {
        Self {
            target: BindingTarget::Widget(id),
            property: Some(property),
            axis: None,
        }
    }

    /// Binding through a symbolic path, e.g. `["b1"]` + `"width"`.
    pub fn path(segments: Vec<Segment>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            property: Property::from_name(&field),
            target: BindingTarget::Path { segments, field },
            axis: None,
        }
    }

    /// `&.innersize`, the reference behind percentages.
    pub fn parent_inner_size() -> Self {
        Self::path(vec![Segment::Parent], "innersize")
    }

    /// Whether this binding yields a different value per axis and no axis is fixed yet.
    fn is_axis_dependent(&self) -> bool {
        self.axis.is_none() && self.property.is_some_and(Property::is_vector)
    }

    fn with_axis(&self, axis: Axis) -> Self {
        let mut fixed = self.clone();
        if fixed.is_axis_dependent() {
            fixed.axis = Some(axis);
        }
        fixed
    }
}

// ---------------------------------------------------------------------------
// Expr
// ---------------------------------------------------------------------------

/// A layout expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(f64),
    Unary {
        op: UnaryOp,
        child: Rc<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Rc<Expr>,
        right: Rc<Expr>,
    },
    Conditional {
        cond: Rc<Expr>,
        then_branch: Rc<Expr>,
        else_branch: Rc<Expr>,
    },
    Call {
        func: Function,
        args: Vec<Rc<Expr>>,
    },
    Binding(BindingRef),
    /// `20%`: `percent / 100` times the parent's inner size along the axis.
    Percentage {
        percent: f64,
        parent: BindingRef,
    },
    /// `{x, y}`. Only exists in 2-D parse trees before projection.
    Pair(Rc<Expr>, Rc<Expr>),
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Rc<Expr>, right: Rc<Expr>) -> Expr {
        Expr::Binary { op, left, right }
    }

    /// Whether a `{x, y}` literal appears anywhere in the tree.
    pub fn contains_pair(&self) -> bool {
        match self {
            Expr::Pair(..) => true,
            Expr::Constant(_) | Expr::Binding(_) | Expr::Percentage { .. } => false,
            Expr::Unary { child, .. } => child.contains_pair(),
            Expr::Binary { left, right, .. } => left.contains_pair() || right.contains_pair(),
            Expr::Conditional { cond, then_branch, else_branch } => {
                cond.contains_pair() || then_branch.contains_pair() || else_branch.contains_pair()
            }
            Expr::Call { args, .. } => args.iter().any(|a| a.contains_pair()),
        }
    }

    /// Whether the expression is two-dimensional.
    ///
    /// Percentages are scalar: they scale by whichever axis the layout feeds.
    pub fn is_vector(&self) -> bool {
        match self {
            Expr::Pair(..) => true,
            Expr::Constant(_) | Expr::Percentage { .. } => false,
            Expr::Binding(b) => b.is_axis_dependent(),
            Expr::Unary { child, .. } => child.is_vector(),
            Expr::Binary { op, left, right } => {
                op.is_arithmetic() && (left.is_vector() || right.is_vector())
            }
            Expr::Conditional { then_branch, else_branch, .. } => {
                then_branch.is_vector() || else_branch.is_vector()
            }
            Expr::Call { args, .. } => args.iter().any(|a| a.is_vector()),
        }
    }

    /// Project a 2-D expression onto `axis`, producing a scalar tree.
    ///
    /// - `{x, y}` keeps the component for `axis`
    /// - axis-dependent bindings and percentages get `axis` fixed
    /// - `==` / `!=` with a 2-D operand compares both components
    /// - ordering and logic on 2-D operands are errors
    pub fn project(&self, axis: Axis) -> Result<Rc<Expr>, ParseError> {
        let projected = match self {
            Expr::Constant(_) => self.clone(),
            Expr::Binding(b) => Expr::Binding(b.with_axis(axis)),
            Expr::Percentage { percent, parent } => Expr::Percentage {
                percent: *percent,
                parent: parent.with_axis(axis),
            },
            Expr::Pair(x, y) => {
                let component = match axis {
                    Axis::X => x,
                    Axis::Y => y,
                };
                if component.is_vector() {
                    return Err(ParseError::InvalidVectorOperation(
                        "nested 2-D value inside '{x, y}'".into(),
                    ));
                }
                return component.project(axis);
            }
            Expr::Unary { op, child } => Expr::Unary {
                op: *op,
                child: child.project(axis)?,
            },
            Expr::Binary { op, left, right } => {
                let vector_operand = left.is_vector() || right.is_vector();
                match op {
                    BinaryOp::Eq | BinaryOp::Ne if vector_operand => {
                        let (join, cmp) = if *op == BinaryOp::Eq {
                            (BinaryOp::And, BinaryOp::Eq)
                        } else {
                            (BinaryOp::Or, BinaryOp::Ne)
                        };
                        let xs = Expr::binary(cmp, left.project(Axis::X)?, right.project(Axis::X)?);
                        let ys = Expr::binary(cmp, left.project(Axis::Y)?, right.project(Axis::Y)?);
                        Expr::binary(join, Rc::new(xs), Rc::new(ys))
                    }
                    _ if vector_operand && !op.is_arithmetic() => {
                        return Err(ParseError::InvalidVectorOperation(format!(
                            "operator '{}' needs single values",
                            op.symbol()
                        )));
                    }
                    _ => Expr::binary(*op, left.project(axis)?, right.project(axis)?),
                }
            }
            Expr::Conditional { cond, then_branch, else_branch } => {
                if cond.is_vector() {
                    return Err(ParseError::InvalidVectorOperation(
                        "condition must be a single value".into(),
                    ));
                }
                Expr::Conditional {
                    cond: cond.project(axis)?,
                    then_branch: then_branch.project(axis)?,
                    else_branch: else_branch.project(axis)?,
                }
            }
            Expr::Call { func, args } => Expr::Call {
                func: *func,
                args: args
                    .iter()
                    .map(|a| a.project(axis))
                    .collect::<Result<_, _>>()?,
            },
        };
        Ok(Rc::new(projected))
    }

    /// Fix `axis` on every axis-dependent binding and percentage, leaving
    /// everything else untouched. Used when a scalar tree moves into a layout
    /// on a different axis (aggregate comparisons of `Layout2d`).
    pub fn fix_axis(self: &Rc<Self>, axis: Axis) -> Rc<Expr> {
        match self.as_ref() {
            Expr::Constant(_) => Rc::clone(self),
            Expr::Binding(b) if b.is_axis_dependent() => Rc::new(Expr::Binding(b.with_axis(axis))),
            Expr::Binding(_) => Rc::clone(self),
            Expr::Percentage { percent, parent } => Rc::new(Expr::Percentage {
                percent: *percent,
                parent: parent.with_axis(axis),
            }),
            Expr::Pair(x, y) => Rc::new(Expr::Pair(x.fix_axis(axis), y.fix_axis(axis))),
            Expr::Unary { op, child } => Rc::new(Expr::Unary {
                op: *op,
                child: child.fix_axis(axis),
            }),
            Expr::Binary { op, left, right } => {
                Rc::new(Expr::binary(*op, left.fix_axis(axis), right.fix_axis(axis)))
            }
            Expr::Conditional { cond, then_branch, else_branch } => Rc::new(Expr::Conditional {
                cond: cond.fix_axis(axis),
                then_branch: then_branch.fix_axis(axis),
                else_branch: else_branch.fix_axis(axis),
            }),
            Expr::Call { func, args } => Rc::new(Expr::Call {
                func: *func,
                args: args.iter().map(|a| a.fix_axis(axis)).collect(),
            }),
        }
    }
}
