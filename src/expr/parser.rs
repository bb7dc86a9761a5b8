//! Recursive descent layout expression parser.
//!
//! Parses a layout string into an [`Expr`] tree. Uses the logos-based tokenizer
//! from [`crate::expr::tokenizer`]. [`parse_layout`] produces a 1-D tree;
//! [`parse_layout2d`] additionally accepts `{x, y}` and projects the result onto
//! both axes.

use std::rc::Rc;

use crate::error::ParseError;
use crate::expr::ast::{BinaryOp, BindingRef, Expr, Function, Segment, UnaryOp};
use crate::expr::tokenizer::{tokenize, Lexeme, Token};
use crate::geometry::Axis;

/// Deepest nesting of parentheses, braces, conditionals, calls and unary
/// operators the parser accepts.
pub const MAX_NESTING: usize = 64;

/// Most tokens a single layout string may contain. Bounds the height of
/// operator chains, which the parser builds without recursing.
pub const MAX_TOKENS: usize = 1024;

/// Parse a 1-D layout expression.
///
/// Empty and whitespace-only input is the constant `0`.
pub fn parse_layout(input: &str) -> Result<Rc<Expr>, ParseError> {
    let expr = parse_tree(input)?;
    if expr.contains_pair() {
        return Err(ParseError::PairInScalarContext);
    }
    Ok(expr)
}

/// Parse a 2-D layout expression and project it onto both axes.
///
/// `"{&.w - 20, &.h}"`, `"b1.size * 2"` and plain scalars (`"5"` is `{5, 5}`)
/// are all accepted.
pub fn parse_layout2d(input: &str) -> Result<(Rc<Expr>, Rc<Expr>), ParseError> {
    let expr = parse_tree(input)?;
    Ok((expr.project(Axis::X)?, expr.project(Axis::Y)?))
}

fn parse_tree(input: &str) -> Result<Rc<Expr>, ParseError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(Rc::new(Expr::Constant(0.0)));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ParseError::ExpressionTooLong(MAX_TOKENS));
    }

    let mut parser = Parser { tokens, cursor: 0, depth: 0 };
    let expr = parser.parse_expr()?;

    if let Some(tok) = parser.peek() {
        return Err(ParseError::UnexpectedToken {
            position: tok.start,
            message: format!("trailing input '{}'", tok.text),
        });
    }
    Ok(expr)
}

/// Recursive descent parser state.
struct Parser {
    tokens: Vec<Lexeme>,
    cursor: usize,
    /// Current recursion depth, capped at [`MAX_NESTING`].
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Lexeme> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|l| l.token)
    }

    fn peek_token_at(&self, offset: usize) -> Option<Token> {
        self.tokens.get(self.cursor + offset).map(|l| l.token)
    }

    fn advance(&mut self) -> Option<&Lexeme> {
        if self.cursor < self.tokens.len() {
            let tok = &self.tokens[self.cursor];
            self.cursor += 1;
            Some(tok)
        } else {
            None
        }
    }

    fn expect(&mut self, expected: Token) -> Result<Lexeme, ParseError> {
        match self.advance() {
            Some(tok) if tok.token == expected => Ok(tok.clone()),
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: tok.start,
                message: format!("expected {:?}, got {:?} '{}'", expected, tok.token, tok.text),
            }),
            None => Err(ParseError::UnexpectedEof(format!("expected {:?}", expected))),
        }
    }

    /// Consume the next token if it is one of `candidates`.
    fn eat_any(&mut self, candidates: &[Token]) -> Option<Token> {
        let token = self.peek_token()?;
        if candidates.contains(&token) {
            self.cursor += 1;
            Some(token)
        } else {
            None
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Rc<Expr>, ParseError>,
    ) -> Result<Rc<Expr>, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::NestingTooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // -----------------------------------------------------------------------
    // Precedence levels
    // -----------------------------------------------------------------------

    /// Every nested construct re-enters here, so this is where depth is counted.
    fn parse_expr(&mut self) -> Result<Rc<Expr>, ParseError> {
        self.nested(Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<Rc<Expr>, ParseError> {
        let cond = self.parse_or()?;
        if self.eat_any(&[Token::Question]).is_none() {
            return Ok(cond);
        }
        let then_branch = self.parse_expr()?;
        self.expect(Token::Colon)?;
        let else_branch = self.parse_expr()?;
        Ok(Rc::new(Expr::Conditional { cond, then_branch, else_branch }))
    }

    fn parse_or(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat_any(&[Token::OrOr, Token::Or]).is_some() {
            let right = self.parse_and()?;
            left = Rc::new(Expr::binary(BinaryOp::Or, left, right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut left = self.parse_equality()?;
        while self.eat_any(&[Token::AndAnd, Token::And]).is_some() {
            let right = self.parse_equality()?;
            left = Rc::new(Expr::binary(BinaryOp::And, left, right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut left = self.parse_relation()?;
        while let Some(token) = self.eat_any(&[Token::EqEq, Token::NotEq]) {
            let op = if token == Token::EqEq { BinaryOp::Eq } else { BinaryOp::Ne };
            let right = self.parse_relation()?;
            left = Rc::new(Expr::binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_relation(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some(token) =
            self.eat_any(&[Token::Less, Token::LessEq, Token::Greater, Token::GreaterEq])
        {
            let op = match token {
                Token::Less => BinaryOp::Lt,
                Token::LessEq => BinaryOp::Le,
                Token::Greater => BinaryOp::Gt,
                _ => BinaryOp::Ge,
            };
            let right = self.parse_additive()?;
            left = Rc::new(Expr::binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut left = self.parse_term()?;
        while let Some(token) = self.eat_any(&[Token::Plus, Token::Minus]) {
            let op = if token == Token::Plus { BinaryOp::Add } else { BinaryOp::Sub };
            let right = self.parse_term()?;
            left = Rc::new(Expr::binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(token) = self.eat_any(&[Token::Star, Token::Slash, Token::Modulo]) {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            let right = self.parse_unary()?;
            left = Rc::new(Expr::binary(op, left, right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Rc<Expr>, ParseError> {
        match self.eat_any(&[Token::Plus, Token::Minus]) {
            Some(token) => {
                let op = if token == Token::Plus { UnaryOp::Plus } else { UnaryOp::Minus };
                let child = self.nested(Self::parse_unary)?;
                Ok(Rc::new(Expr::Unary { op, child }))
            }
            None => self.parse_primary(),
        }
    }

    // -----------------------------------------------------------------------
    // Primaries
    // -----------------------------------------------------------------------

    fn parse_primary(&mut self) -> Result<Rc<Expr>, ParseError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(ParseError::UnexpectedEof("expected a value".into()));
        };

        match tok.token {
            Token::Number => {
                self.cursor += 1;
                Ok(Rc::new(Expr::Constant(parse_number(&tok.text)?)))
            }
            Token::Percent => {
                self.cursor += 1;
                let percent = parse_number(tok.text.trim_end_matches('%'))?;
                Ok(Rc::new(Expr::Percentage {
                    percent,
                    parent: BindingRef::parent_inner_size(),
                }))
            }
            Token::ParenOpen => {
                self.cursor += 1;
                let inner = self.parse_expr()?;
                self.expect(Token::ParenClose)?;
                Ok(inner)
            }
            Token::BraceOpen => {
                self.cursor += 1;
                let x = self.parse_expr()?;
                self.expect(Token::Comma)?;
                let y = self.parse_expr()?;
                self.expect(Token::BraceClose)?;
                Ok(Rc::new(Expr::Pair(x, y)))
            }
            // `if.size` names a widget called "if".
            Token::If if self.peek_token_at(1) != Some(Token::Dot) => {
                self.cursor += 1;
                let cond = self.parse_expr()?;
                self.expect(Token::Then)?;
                let then_branch = self.parse_expr()?;
                self.expect(Token::Else)?;
                let else_branch = self.parse_expr()?;
                Ok(Rc::new(Expr::Conditional { cond, then_branch, else_branch }))
            }
            Token::Ident if self.peek_token_at(1) == Some(Token::ParenOpen) => self.parse_call(&tok),
            Token::Ident | Token::Amp => self.parse_path(),
            token if token.is_keyword() => self.parse_path(),
            _ => Err(ParseError::UnexpectedToken {
                position: tok.start,
                message: format!("expected a value, got '{}'", tok.text),
            }),
        }
    }

    fn parse_call(&mut self, name: &Lexeme) -> Result<Rc<Expr>, ParseError> {
        let func = Function::from_name(&name.text)
            .ok_or_else(|| ParseError::UnknownFunction(name.text.clone()))?;
        self.cursor += 1;
        self.expect(Token::ParenOpen)?;

        let mut args = Vec::new();
        if self.eat_any(&[Token::ParenClose]).is_none() {
            loop {
                args.push(self.parse_expr()?);
                if self.eat_any(&[Token::Comma]).is_none() {
                    break;
                }
            }
            self.expect(Token::ParenClose)?;
        }
        Ok(Rc::new(Expr::Call { func, args }))
    }

    /// `segment ('.' segment)*`; the last segment is the property.
    fn parse_path(&mut self) -> Result<Rc<Expr>, ParseError> {
        let mut names: Vec<Lexeme> = vec![self.parse_segment()?];
        while self.eat_any(&[Token::Dot]).is_some() {
            names.push(self.parse_segment()?);
        }

        let Some(last) = names.pop() else {
            return Err(ParseError::UnexpectedEof("expected a binding".into()));
        };
        let segments = names
            .into_iter()
            .map(|lexeme| match lexeme.token {
                Token::Amp => Segment::Parent,
                _ if lexeme.text == "parent" => Segment::Parent,
                _ => Segment::Name(lexeme.text),
            })
            .collect();

        Ok(Rc::new(Expr::Binding(BindingRef::path(segments, last.text))))
    }

    fn parse_segment(&mut self) -> Result<Lexeme, ParseError> {
        match self.advance() {
            Some(tok) if tok.token == Token::Ident || tok.token == Token::Amp || tok.token.is_keyword() => {
                Ok(tok.clone())
            }
            Some(tok) => Err(ParseError::UnexpectedToken {
                position: tok.start,
                message: format!("expected a name, got '{}'", tok.text),
            }),
            None => Err(ParseError::UnexpectedEof("expected a name after '.'".into())),
        }
    }
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    text.parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ast::{BindingTarget, Property};
    use pretty_assertions::assert_eq;

    fn c(v: f64) -> Rc<Expr> {
        Rc::new(Expr::Constant(v))
    }

    fn bin(op: BinaryOp, left: Rc<Expr>, right: Rc<Expr>) -> Rc<Expr> {
        Rc::new(Expr::binary(op, left, right))
    }

    fn binding(expr: &Expr) -> &BindingRef {
        match expr {
            Expr::Binding(b) => b,
            other => panic!("expected binding, got {other:?}"),
        }
    }

    // ── Literals ─────────────────────────────────────────────────────

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(*parse_layout("").unwrap(), Expr::Constant(0.0));
        assert_eq!(*parse_layout("   ").unwrap(), Expr::Constant(0.0));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(*parse_layout("12").unwrap(), Expr::Constant(12.0));
        assert_eq!(*parse_layout(".5").unwrap(), Expr::Constant(0.5));
        assert_eq!(*parse_layout("3.").unwrap(), Expr::Constant(3.0));
    }

    #[test]
    fn test_percentage_binds_parent_inner_size() {
        let expr = parse_layout("20%").unwrap();
        match expr.as_ref() {
            Expr::Percentage { percent, parent } => {
                assert_eq!(*percent, 20.0);
                assert_eq!(*parent, BindingRef::parent_inner_size());
            }
            other => panic!("expected percentage, got {other:?}"),
        }
    }

    // ── Precedence ───────────────────────────────────────────────────

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse_layout("1 + 2 * 3").unwrap(),
            bin(BinaryOp::Add, c(1.0), bin(BinaryOp::Mul, c(2.0), c(3.0)))
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse_layout("8 - 2 - 1").unwrap(),
            bin(BinaryOp::Sub, bin(BinaryOp::Sub, c(8.0), c(2.0)), c(1.0))
        );
    }

    #[test]
    fn test_comparison_below_arithmetic() {
        assert_eq!(
            parse_layout("1 + 1 == 2").unwrap(),
            bin(BinaryOp::Eq, bin(BinaryOp::Add, c(1.0), c(1.0)), c(2.0))
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        assert_eq!(
            parse_layout("1 or 0 and 0").unwrap(),
            bin(BinaryOp::Or, c(1.0), bin(BinaryOp::And, c(0.0), c(0.0)))
        );
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(
            parse_layout("-2 * 3").unwrap(),
            bin(
                BinaryOp::Mul,
                Rc::new(Expr::Unary { op: UnaryOp::Minus, child: c(2.0) }),
                c(3.0)
            )
        );
    }

    #[test]
    fn test_double_unary() {
        let expr = parse_layout("--1").unwrap();
        assert!(matches!(expr.as_ref(), Expr::Unary { op: UnaryOp::Minus, .. }));
    }

    // ── Conditionals ─────────────────────────────────────────────────

    #[test]
    fn test_ternary() {
        let expr = parse_layout("1 < 2 ? 5 : 6").unwrap();
        match expr.as_ref() {
            Expr::Conditional { cond, then_branch, else_branch } => {
                assert_eq!(*cond, bin(BinaryOp::Lt, c(1.0), c(2.0)));
                assert_eq!(*then_branch, c(5.0));
                assert_eq!(*else_branch, c(6.0));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_if_else_extends_right() {
        // The else branch swallows `+ 3`.
        let expr = parse_layout("1 + if 0 then 2 else 4 + 3").unwrap();
        match expr.as_ref() {
            Expr::Binary { op: BinaryOp::Add, right, .. } => match right.as_ref() {
                Expr::Conditional { else_branch, .. } => {
                    assert_eq!(*else_branch, bin(BinaryOp::Add, c(4.0), c(3.0)));
                }
                other => panic!("expected conditional, got {other:?}"),
            },
            other => panic!("expected addition, got {other:?}"),
        }
    }

    #[test]
    fn test_incomplete_conditionals_fail() {
        assert!(parse_layout("if 1 then 2").is_err());
        assert!(parse_layout("if 0 else 2").is_err());
        assert!(parse_layout("1 ? 2").is_err());
    }

    // ── Functions ────────────────────────────────────────────────────

    #[test]
    fn test_function_calls() {
        let expr = parse_layout("min(1, 2, 3)").unwrap();
        match expr.as_ref() {
            Expr::Call { func, args } => {
                assert_eq!(*func, Function::Min);
                assert_eq!(args.len(), 3);
            }
            other => panic!("expected call, got {other:?}"),
        }
        let expr = parse_layout("max()").unwrap();
        assert!(matches!(expr.as_ref(), Expr::Call { func: Function::Max, args } if args.is_empty()));
    }

    #[test]
    fn test_unknown_function() {
        assert_eq!(
            parse_layout("avg(1, 2)").unwrap_err(),
            ParseError::UnknownFunction("avg".into())
        );
    }

    #[test]
    fn test_function_name_without_call_is_binding() {
        let expr = parse_layout("min.width").unwrap();
        let b = binding(&expr);
        assert_eq!(b.property, Some(Property::Width));
        assert_eq!(
            b.target,
            BindingTarget::Path { segments: vec![Segment::Name("min".into())], field: "width".into() }
        );
    }

    // ── Paths ────────────────────────────────────────────────────────

    #[test]
    fn test_single_segment_refers_to_owner() {
        let expr = parse_layout("width").unwrap();
        let b = binding(&expr);
        assert_eq!(b.property, Some(Property::Width));
        assert_eq!(b.target, BindingTarget::Path { segments: vec![], field: "width".into() });
    }

    #[test]
    fn test_parent_chain() {
        let expr = parse_layout("parent.b1.&.x").unwrap();
        let b = binding(&expr);
        assert_eq!(
            b.target,
            BindingTarget::Path {
                segments: vec![Segment::Parent, Segment::Name("b1".into()), Segment::Parent],
                field: "x".into(),
            }
        );
        assert_eq!(b.property, Some(Property::Left));
    }

    #[test]
    fn test_unknown_property_has_none() {
        let expr = parse_layout("b1.p").unwrap();
        assert_eq!(binding(&expr).property, None);
        let expr = parse_layout("xyz").unwrap();
        assert_eq!(binding(&expr).property, None);
    }

    #[test]
    fn test_keywords_as_names() {
        let expr = parse_layout("then.size").unwrap();
        assert_eq!(
            binding(&expr).target,
            BindingTarget::Path { segments: vec![Segment::Name("then".into())], field: "size".into() }
        );
        let expr = parse_layout("if.w + b1.else.h").unwrap();
        assert!(matches!(expr.as_ref(), Expr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn test_keyword_collisions_inside_conditionals() {
        let inputs = [
            "if widgetif.h then widgetif.x else widgetif.y + if 0 then widgetif.w else 2",
            "if thenwidget.h then thenwidget.x else thenwidget.y + if 0 then thenwidget.w else 2",
            "if if elsew.x then elsew.x.y + if elsew.w then 5 else elsew.h else 7 then 8 else 9",
        ];
        for input in inputs {
            assert!(parse_layout(input).is_ok(), "{input} should parse");
        }
    }

    // ── Errors ───────────────────────────────────────────────────────

    #[test]
    fn test_malformed_inputs() {
        for input in ["(5", "6)", "[1, 2]", "{3}", "5 +", "b1.", "1 2", ")"] {
            assert!(parse_layout(input).is_err(), "{input} should fail");
        }
    }

    #[test]
    fn test_trailing_input_position() {
        match parse_layout("6)").unwrap_err() {
            ParseError::UnexpectedToken { position, .. } => assert_eq!(position, 1),
            other => panic!("expected unexpected token, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(*parse_layout(&nested(MAX_NESTING - 1)).unwrap(), Expr::Constant(1.0));
        assert_eq!(
            parse_layout(&nested(MAX_NESTING)).unwrap_err(),
            ParseError::NestingTooDeep(MAX_NESTING)
        );
        assert_eq!(
            parse_layout(&nested(1000)).unwrap_err(),
            ParseError::NestingTooDeep(MAX_NESTING)
        );
        assert_eq!(
            parse_layout(&"-".repeat(500)).unwrap_err(),
            ParseError::NestingTooDeep(MAX_NESTING)
        );
        let conditionals = format!("{}1{}", "if 1 then ".repeat(100), " else 0".repeat(100));
        assert_eq!(parse_layout(&conditionals).unwrap_err(), ParseError::NestingTooDeep(MAX_NESTING));
        let calls = format!("{}1{}", "min(".repeat(100), ")".repeat(100));
        assert_eq!(parse_layout(&calls).unwrap_err(), ParseError::NestingTooDeep(MAX_NESTING));
    }

    #[test]
    fn test_token_limit() {
        let chain = |terms: usize| vec!["1"; terms].join(" + ");
        // `terms` numbers and `terms - 1` operators.
        assert!(parse_layout(&chain(MAX_TOKENS / 2)).is_ok());
        assert_eq!(
            parse_layout(&chain(MAX_TOKENS)).unwrap_err(),
            ParseError::ExpressionTooLong(MAX_TOKENS)
        );
    }

    #[test]
    fn test_pair_rejected_in_scalar_context() {
        assert_eq!(parse_layout("{3, 2}").unwrap_err(), ParseError::PairInScalarContext);
        assert_eq!(parse_layout("1 + {3, 2}").unwrap_err(), ParseError::PairInScalarContext);
    }

    // ── 2-D ──────────────────────────────────────────────────────────

    #[test]
    fn test_pair_projection() {
        let (x, y) = parse_layout2d("{&.w - 20, &.h}").unwrap();
        assert!(matches!(x.as_ref(), Expr::Binary { op: BinaryOp::Sub, .. }));
        assert_eq!(binding(&y).property, Some(Property::Height));
    }

    #[test]
    fn test_scalar_broadcasts() {
        let (x, y) = parse_layout2d("5").unwrap();
        assert_eq!(*x, Expr::Constant(5.0));
        assert_eq!(*y, Expr::Constant(5.0));
    }

    #[test]
    fn test_vector_binding_gets_axis() {
        let (x, y) = parse_layout2d("b1.size").unwrap();
        assert_eq!(binding(&x).axis, Some(Axis::X));
        assert_eq!(binding(&y).axis, Some(Axis::Y));
    }

    #[test]
    fn test_vector_ordering_fails() {
        assert!(matches!(
            parse_layout2d("b1.pos < b2.pos"),
            Err(ParseError::InvalidVectorOperation(_))
        ));
    }

    #[test]
    fn test_nested_pair_fails() {
        assert!(parse_layout2d("{{1, 2}, 3}").is_err());
    }
}
