use std::fmt;

use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Failures that abort the stage they occur in.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("out of memory while building the {0}")]
    OutOfMemory(&'static str),
    #[error("backpatch error: {0}")]
    Backpatch(String),
    #[error("no code can be generated for a malformed expression at line {0}")]
    MalformedTree(usize),
    #[error("identifier {0:?} has no storage location")]
    UnknownSymbol(String),
}

impl From<std::collections::TryReserveError> for CompileError {
    fn from(_: std::collections::TryReserveError) -> Self {
        CompileError::OutOfMemory("syntax tree")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Lexical { line: usize, lexeme: String },
    Syntax { line: usize, message: String },
    Type { line: usize, message: String },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::Lexical { line, .. }
            | Diagnostic::Syntax { line, .. }
            | Diagnostic::Type { line, .. } => *line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Lexical { line, lexeme } => {
                write!(f, "Lexical error at line {}: unexpected token -> ERROR: {}", line, lexeme)
            }
            Diagnostic::Syntax { line, message } => {
                write!(f, "Syntax error at line {}: {}", line, message)
            }
            Diagnostic::Type { line, message } => {
                write!(f, "Type error at line {}: {}", line, message)
            }
        }
    }
}

/// Errors collected over one compilation. Stages never stop on a diagnostic;
/// the next stage checks `has_errors` once before it starts.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    reported: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(line = diagnostic.line(), %diagnostic, "diagnostic reported");
        self.reported.push(diagnostic);
    }

    pub fn syntax(&mut self, line: usize, message: impl Into<String>) {
        self.report(Diagnostic::Syntax {
            line,
            message: message.into(),
        });
    }

    pub fn type_error(&mut self, line: usize, message: impl Into<String>) {
        self.report(Diagnostic::Type {
            line,
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.reported.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reported.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_accumulate_in_order() {
        let mut diagnostics = Diagnostics::new();
        assert!(!diagnostics.has_errors());

        diagnostics.syntax(3, "unexpected token -> ;");
        diagnostics.type_error(1, "if test is not Boolean");

        assert_eq!(diagnostics.len(), 2);
        let lines = diagnostics.iter().map(Diagnostic::line).collect::<Vec<_>>();
        assert_eq!(lines, vec![3, 1]);
    }

    #[test]
    fn diagnostic_messages_carry_line() {
        let d = Diagnostic::Type {
            line: 4,
            message: "write of non-integer value".to_owned(),
        };
        assert_eq!(d.to_string(), "Type error at line 4: write of non-integer value");

        let d = Diagnostic::Lexical {
            line: 2,
            lexeme: ":".to_owned(),
        };
        assert_eq!(d.to_string(), "Lexical error at line 2: unexpected token -> ERROR: :");
    }
}
