//! Expression evaluation.
//!
//! Evaluation is a pure function of the bound widget geometry. Its only side
//! effects are memoising path resolutions and recording dependency edges.

use std::cell::RefCell;
use std::collections::HashSet;

use tracing::debug;

use crate::expr::ast::{BinaryOp, BindingRef, BindingTarget, Expr, Function, UnaryOp};
use crate::geometry::Axis;
use crate::layout::resolve::{LayoutHost, ResolutionCache};
use crate::widget::node::{Dependent, WidgetId};

/// Evaluation context for one layout.
pub struct Evaluator<'a> {
    pub host: &'a dyn LayoutHost,
    /// Widget that owns the layout; the start of every path.
    pub owner: Option<WidgetId>,
    /// Slot being computed. `None` for one-off evaluations that record no edges.
    pub dependent: Option<Dependent>,
    /// Axis used for bindings to 2-D properties that have none fixed.
    pub axis: Axis,
    pub resolutions: &'a ResolutionCache,
    /// Source slots read so far, kept so a replaced layout can drop its edges.
    pub sources: &'a RefCell<HashSet<Dependent>>,
}

impl Evaluator<'_> {
    pub fn eval(&self, expr: &Expr) -> f64 {
        match expr {
            Expr::Constant(value) => *value,
            Expr::Unary { op, child } => {
                let value = self.eval(child);
                match op {
                    UnaryOp::Plus => value,
                    UnaryOp::Minus => -value,
                }
            }
            Expr::Binary { op, left, right } => apply(*op, self.eval(left), self.eval(right)),
            Expr::Conditional { cond, then_branch, else_branch } => {
                // Every branch runs so both sides register their dependencies.
                let cond = self.eval(cond);
                let then_value = self.eval(then_branch);
                let else_value = self.eval(else_branch);
                if cond != 0.0 { then_value } else { else_value }
            }
            Expr::Call { func, args } => {
                let values: Vec<f64> = args.iter().map(|a| self.eval(a)).collect();
                call(*func, &values)
            }
            Expr::Binding(binding) => self.read_binding(binding),
            Expr::Percentage { percent, parent } => percent / 100.0 * self.read_binding(parent),
            Expr::Pair(x, y) => match self.axis {
                Axis::X => self.eval(x),
                Axis::Y => self.eval(y),
            },
        }
    }

    fn read_binding(&self, binding: &BindingRef) -> f64 {
        let Some(property) = binding.property else {
            debug!(?binding.target, "binding names no known property");
            return 0.0;
        };

        let widget = match &binding.target {
            BindingTarget::Widget(id) => Some(*id).filter(|&id| self.host.contains(id)),
            BindingTarget::Path { segments, .. } => {
                self.resolutions.resolve(self.host, self.owner, segments)
            }
        };
        let Some(widget) = widget else {
            debug!(?binding.target, owner = ?self.owner, "binding did not resolve");
            return 0.0;
        };

        let property = property.component(binding.axis.unwrap_or(self.axis));
        if let Some(dependent) = self.dependent {
            for &slot in property.slots() {
                let source = Dependent::new(widget, slot);
                if source != dependent {
                    self.host.track(source, dependent);
                    self.sources.borrow_mut().insert(source);
                }
            }
        }
        self.host.read(widget, property)
    }
}

/// Apply a binary operator. Comparisons and logic yield `1.0` or `0.0`.
pub fn apply(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => {
            if right == 0.0 { 0.0 } else { left / right }
        }
        BinaryOp::Rem => {
            if right == 0.0 { 0.0 } else { left % right }
        }
        BinaryOp::Eq => truth(left == right),
        BinaryOp::Ne => truth(left != right),
        BinaryOp::Lt => truth(left < right),
        BinaryOp::Le => truth(left <= right),
        BinaryOp::Gt => truth(left > right),
        BinaryOp::Ge => truth(left >= right),
        BinaryOp::And => truth(left != 0.0 && right != 0.0),
        BinaryOp::Or => truth(left != 0.0 || right != 0.0),
    }
}

/// Call a built-in function on already evaluated arguments.
pub fn call(func: Function, args: &[f64]) -> f64 {
    match func {
        Function::Min => args.iter().copied().reduce(f64::min).unwrap_or(0.0),
        Function::Max => args.iter().copied().reduce(f64::max).unwrap_or(0.0),
        Function::Range => match args {
            [lo, hi, value] => value.max(*lo).min(*hi),
            _ => 0.0,
        },
    }
}

fn truth(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::parse_layout;
    use crate::layout::resolve::Detached;

    fn eval(input: &str) -> f64 {
        let expr = parse_layout(input).expect("input should parse");
        let resolutions = ResolutionCache::default();
        let sources = RefCell::new(HashSet::new());
        let evaluator = Evaluator {
            host: &Detached::default(),
            owner: None,
            dependent: None,
            axis: Axis::X,
            resolutions: &resolutions,
            sources: &sources,
        };
        evaluator.eval(&expr)
    }

    // ── Arithmetic ───────────────────────────────────────────────────

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 / 4"), 2.5);
        assert_eq!(eval("-3 + 1"), -2.0);
        assert_eq!(eval("+4"), 4.0);
        assert_eq!(eval("--4"), 4.0);
    }

    #[test]
    fn remainder_truncates_toward_zero() {
        assert_eq!(eval("5 % 3"), 2.0);
        assert_eq!(eval("5%3"), 2.0);
        assert_eq!(eval("-10 % 3"), -1.0);
        assert_eq!(eval("10 % -3"), 1.0);
        assert_eq!(eval("5.5 % 2"), 1.5);
    }

    #[test]
    fn division_by_zero_is_zero() {
        assert_eq!(eval("5 / 0"), 0.0);
        assert_eq!(eval("5 % 0"), 0.0);
        assert_eq!(eval("1 + 5 / (2 - 2)"), 1.0);
    }

    // ── Comparisons and logic ────────────────────────────────────────

    #[test]
    fn comparisons() {
        assert_eq!(eval("1 < 2"), 1.0);
        assert_eq!(eval("2 <= 2"), 1.0);
        assert_eq!(eval("1 > 2"), 0.0);
        assert_eq!(eval("3 >= 4"), 0.0);
        assert_eq!(eval("2 == 2"), 1.0);
        assert_eq!(eval("2 != 2"), 0.0);
    }

    #[test]
    fn logic() {
        assert_eq!(eval("1 && 0"), 0.0);
        assert_eq!(eval("2 and 3"), 1.0);
        assert_eq!(eval("0 || 0"), 0.0);
        assert_eq!(eval("0 or 5"), 1.0);
    }

    #[test]
    fn conditionals() {
        assert_eq!(eval("if 1 < 2 then 5 else 6"), 5.0);
        assert_eq!(eval("if 1 == 2 then 5 else 6"), 6.0);
        assert_eq!(eval("if 1 <= 2 then if 3 then 5 else 6 else 7"), 5.0);
        assert_eq!(eval("if 1 > 2 then if 0 then 5 else 6 else 7"), 7.0);
        assert_eq!(eval("if 2 * if 1 then 2 else 3 < 5 then 8 else 9"), 8.0);
        assert_eq!(eval("1 ? 2 : 3"), 2.0);
        assert_eq!(eval("0 ? 2 : 0 ? 3 : 4"), 4.0);
    }

    // ── Functions ────────────────────────────────────────────────────

    #[test]
    fn min_max() {
        assert_eq!(eval("min(3, 1, 2)"), 1.0);
        assert_eq!(eval("max(3, 1, 2)"), 3.0);
        assert_eq!(eval("min(2)"), 2.0);
        assert_eq!(eval("min()"), 0.0);
        assert_eq!(eval("max()"), 0.0);
    }

    #[test]
    fn range_clamps() {
        assert_eq!(eval("range(0, 10, 15)"), 10.0);
        assert_eq!(eval("range(0, 10, -5)"), 0.0);
        assert_eq!(eval("range(0, 10, 4)"), 4.0);
        assert_eq!(eval("range(0, 10)"), 0.0);
        assert_eq!(eval("range(1, 2, 3, 4)"), 0.0);
    }

    // ── Bindings without a tree ──────────────────────────────────────

    #[test]
    fn detached_bindings_are_zero() {
        assert_eq!(eval("b1.width + 3"), 3.0);
        assert_eq!(eval("&.x"), 0.0);
        assert_eq!(eval("50%"), 0.0);
        assert_eq!(eval("xyz"), 0.0);
        assert_eq!(eval("if widgetif.h then widgetif.x else widgetif.y + if 0 then widgetif.w else 2"), 2.0);
    }
}
