//! Error types for layout expression parsing.
//!
//! Only the parser produces errors. Resolution and arity problems degrade to
//! zero at evaluation time and never surface as `Err`.

/// Errors from layout expression parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unrecognized input at byte {position}: '{text}'")]
    Lex { position: usize, text: String },
    #[error("unexpected token at position {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("2-D value '{{x, y}}' used where a single value is expected")]
    PairInScalarContext,
    #[error("invalid operation on 2-D values: {0}")]
    InvalidVectorOperation(String),
    #[error("expression nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("expression longer than {0} tokens")]
    ExpressionTooLong(usize),
}
