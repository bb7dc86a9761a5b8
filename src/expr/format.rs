//! Render expression trees back to layout strings.
//!
//! The output parses back to an equivalent tree. Parentheses are inserted only
//! where precedence requires them.

use crate::expr::ast::{BindingRef, BindingTarget, Expr, Property, Segment, UnaryOp};
use crate::geometry::Axis;
use crate::widget::node::WidgetId;

const PREC_CONDITIONAL: u8 = 1;
const PREC_OR: u8 = 2;
const PREC_UNARY: u8 = 8;
const PREC_PRIMARY: u8 = 9;

/// Render `expr` as a layout string.
///
/// `name_of` names widgets referenced by [`BindingTarget::Widget`]. Returns
/// `None` when a widget cannot be named or a constant is not finite.
pub fn to_expression_string(
    expr: &Expr,
    name_of: &dyn Fn(WidgetId) -> Option<String>,
) -> Option<String> {
    Formatter { name_of }.render(expr).map(|(text, _)| text)
}

struct Formatter<'a> {
    name_of: &'a dyn Fn(WidgetId) -> Option<String>,
}

impl Formatter<'_> {
    /// Text of `expr` and the precedence of its outermost construct.
    fn render(&self, expr: &Expr) -> Option<(String, u8)> {
        match expr {
            Expr::Constant(value) => Some((number(*value)?, PREC_PRIMARY)),
            Expr::Percentage { percent, .. } => Some((format!("{}%", number(*percent)?), PREC_PRIMARY)),
            Expr::Binding(binding) => Some((self.binding(binding)?, PREC_PRIMARY)),
            Expr::Unary { op, child } => {
                let sign = match op {
                    UnaryOp::Plus => "+",
                    UnaryOp::Minus => "-",
                };
                Some((format!("{sign}{}", self.operand(child, PREC_UNARY)?), PREC_UNARY))
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                let left = self.operand(left, prec)?;
                let right = self.operand(right, prec + 1)?;
                Some((format!("{left} {} {right}", op.symbol()), prec))
            }
            Expr::Conditional { cond, then_branch, else_branch } => {
                let cond = self.operand(cond, PREC_OR)?;
                let then_branch = self.operand(then_branch, PREC_CONDITIONAL)?;
                let else_branch = self.operand(else_branch, PREC_CONDITIONAL)?;
                Some((format!("{cond} ? {then_branch} : {else_branch}"), PREC_CONDITIONAL))
            }
            Expr::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|a| self.operand(a, PREC_CONDITIONAL))
                    .collect::<Option<Vec<_>>>()?;
                Some((format!("{}({})", func.name(), args.join(", ")), PREC_PRIMARY))
            }
            Expr::Pair(x, y) => {
                let x = self.operand(x, PREC_CONDITIONAL)?;
                let y = self.operand(y, PREC_CONDITIONAL)?;
                Some((format!("{{{x}, {y}}}"), PREC_PRIMARY))
            }
        }
    }

    /// Render a child, parenthesised if it binds looser than `min_prec`.
    fn operand(&self, expr: &Expr, min_prec: u8) -> Option<String> {
        let (text, prec) = self.render(expr)?;
        if prec < min_prec {
            Some(format!("({text})"))
        } else {
            Some(text)
        }
    }

    fn binding(&self, binding: &BindingRef) -> Option<String> {
        // A fixed axis turns `size` into `width` / `height` so the string
        // keeps its meaning in a layout on the other axis.
        let field = match (binding.property, binding.axis) {
            (Some(property), Some(axis)) if property.is_vector() => {
                Some(component_name(property, axis))
            }
            _ => None,
        };

        match &binding.target {
            BindingTarget::Widget(id) => {
                let name = (self.name_of)(*id)?;
                let property = binding.property?;
                Some(format!("{name}.{}", field.unwrap_or_else(|| property.name())))
            }
            BindingTarget::Path { segments, field: written } => {
                let mut parts: Vec<&str> = segments
                    .iter()
                    .map(|segment| match segment {
                        Segment::Parent => "&",
                        Segment::Name(name) => name.as_str(),
                    })
                    .collect();
                parts.push(field.unwrap_or(written.as_str()));
                Some(parts.join("."))
            }
        }
    }
}

fn component_name(property: Property, axis: Axis) -> &'static str {
    match (property, axis) {
        (Property::Position, Axis::X) => "x",
        (Property::Position, Axis::Y) => "y",
        (Property::Size, Axis::X) => "width",
        (Property::Size, Axis::Y) => "height",
        (Property::InnerSize, Axis::X) => "innerwidth",
        (Property::InnerSize, Axis::Y) => "innerheight",
        (scalar, _) => scalar.name(),
    }
}

fn number(value: f64) -> Option<String> {
    if value.is_finite() {
        Some(format!("{value}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parser::{parse_layout, parse_layout2d};
    use insta::assert_snapshot;

    fn unnamed(_: WidgetId) -> Option<String> {
        None
    }

    fn fmt(input: &str) -> String {
        let expr = parse_layout(input).expect("input should parse");
        to_expression_string(&expr, &unnamed).expect("expression should render")
    }

    #[test]
    fn simple_expressions() {
        assert_snapshot!(fmt("b1.left+10"), @"b1.left + 10");
        assert_snapshot!(fmt("50%"), @"50%");
        assert_snapshot!(fmt("min(2,3)"), @"min(2, 3)");
        assert_snapshot!(fmt("1.5 * &.w"), @"1.5 * &.w");
        assert_snapshot!(fmt("parent.b1.innersize"), @"&.b1.innersize");
    }

    #[test]
    fn parentheses_follow_precedence() {
        assert_snapshot!(fmt("(1 + 2) * 3"), @"(1 + 2) * 3");
        assert_snapshot!(fmt("1 + 2 * 3"), @"1 + 2 * 3");
        assert_snapshot!(fmt("8 - (2 - 1)"), @"8 - (2 - 1)");
        assert_snapshot!(fmt("-(1 + 2)"), @"-(1 + 2)");
        assert_snapshot!(fmt("1 or 0 and 0"), @"1 || 0 && 0");
    }

    #[test]
    fn conditionals_use_ternary_form() {
        assert_snapshot!(fmt("if b1.w > 0 then 1 else 2 + 3"), @"b1.w > 0 ? 1 : 2 + 3");
        assert_snapshot!(fmt("(1 ? 2 : 3) + 1"), @"(1 ? 2 : 3) + 1");
    }

    #[test]
    fn output_reparses_to_same_tree() {
        for input in [
            "b1.right + parent.width / 2",
            "if 1 < 2 then -3 else 4 % 5",
            "range(0, 10, b1.x) - -2",
            "(a.w || b.w) == 0",
        ] {
            let expr = parse_layout(input).unwrap();
            let text = to_expression_string(&expr, &unnamed).unwrap();
            assert_eq!(parse_layout(&text).unwrap(), expr, "{input} -> {text}");
        }
    }

    #[test]
    fn fixed_axis_names_component() {
        let (x, y) = parse_layout2d("b1.size + 5").unwrap();
        assert_snapshot!(to_expression_string(&x, &unnamed).unwrap(), @"b1.width + 5");
        assert_snapshot!(to_expression_string(&y, &unnamed).unwrap(), @"b1.height + 5");
    }

    #[test]
    fn unnamed_widget_binding_is_none() {
        let mut tree = crate::widget::WidgetTree::new();
        let root = tree.insert_root();
        let expr = Expr::Binding(BindingRef::widget(root, Property::Width));
        assert_eq!(to_expression_string(&expr, &unnamed), None);
        let named = |_: WidgetId| Some("gui".to_string());
        assert_eq!(to_expression_string(&expr, &named).as_deref(), Some("gui.width"));
    }

    #[test]
    fn non_finite_constant_is_none() {
        assert_eq!(to_expression_string(&Expr::Constant(f64::NAN), &unnamed), None);
    }
}
