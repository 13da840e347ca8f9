use icumsg_core::SyntaxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use icumsg_core::{SyntaxError, SyntaxErrorKind};

    use super::CompileError;

    #[test]
    fn wraps_syntax_errors_with_offsets() {
        let err = CompileError::from(SyntaxError {
            kind: SyntaxErrorKind::MissingOther,
            message: "missing `other` option".to_string(),
            offset: 21,
        });
        assert_eq!(
            err.to_string(),
            "syntax error: missing `other` option at offset 21"
        );
    }
}
