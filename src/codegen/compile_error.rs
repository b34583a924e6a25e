use codespan::{FileId, Span};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    CodegenError {
        message: String,
        span: Option<Span>,
        file_id: FileId,
    },
    IOError(std::io::Error),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::CodegenError { message, .. } => write!(f, "Codegen error: {}", message),
            CompileError::IOError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::IOError(e)
    }
}

impl CompileError {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            CompileError::CodegenError {
                message,
                span,
                file_id,
            } => Diagnostic::error().with_message(message).with_labels(vec![
                span.map(|s| Label::primary(*file_id, s))
                    .unwrap_or_else(|| Label::primary(*file_id, Span::default())),
            ]),
            CompileError::IOError(e) => {
                Diagnostic::error().with_message(format!("IO error: {}", e))
            }
        }
    }
}
