//! Compile-time error types

use thiserror::Error;

/// Error raised while compiling a task's extraction plan
///
/// Always fatal for the run; converted into `ContractError::Config` by the plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Directive names a type outside the primitive numeric set
    #[error("unknown target type '{name}' for field '{field}'")]
    UnknownTargetType { field: String, name: String },

    /// Directive key other than `byte` / `type`
    #[error("unknown directive '{key}' for field '{field}'")]
    UnknownDirectiveKey { field: String, key: String },

    /// Directive body does not follow `key:value[,key:value]`
    #[error("malformed directive '({body})' for field '{field}': {reason}")]
    MalformedDirective {
        field: String,
        body: String,
        reason: String,
    },

    /// Opening parenthesis of a directive is never closed
    #[error("unterminated directive for field '{field}'")]
    UnterminatedDirective { field: String },

    /// Byte range rejected before any message is seen
    #[error("invalid byte range for field '{field}': {reason}")]
    InvalidByteRange { field: String, reason: String },

    /// Identifier not declared in `field_names`
    #[error("field '{name}' is not declared in field_names")]
    UndeclaredField { name: String },

    /// Identifier followed by `(` that is not a declared field
    #[error("function calls are not allowed: '{name}(...)'")]
    FunctionCall { name: String },

    /// Same field referenced with different directives
    #[error("field '{field}' is referenced with conflicting directives '{first}' and '{second}'")]
    ConflictingDirectives {
        field: String,
        first: String,
        second: String,
    },

    /// Field path syntax error
    #[error("invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },

    /// Residual expression does not parse
    #[error("invalid expression at position {position}: {message}")]
    Expression { position: usize, message: String },
}

impl CompileError {
    pub fn expression(position: usize, message: impl Into<String>) -> Self {
        Self::Expression {
            position,
            message: message.into(),
        }
    }

    pub fn malformed(
        field: impl Into<String>,
        body: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedDirective {
            field: field.into(),
            body: body.into(),
            reason: reason.into(),
        }
    }
}

/// Compile Result type alias
pub type Result<T> = std::result::Result<T, CompileError>;
