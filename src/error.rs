use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    #[error("could not find {marker:?} after offset {offset}")]
    NotFound { marker: String, offset: usize },
}

/// Raised when a builder handler is handed text its own category pattern
/// does not accept, or when a handler loop stops advancing the cursor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}: {span:?}")]
pub struct StructuralParseError {
    pub message: String,
    pub offset: usize,
    pub span: String,
}

impl StructuralParseError {
    pub fn new(message: impl Into<String>, offset: usize, span: &str) -> Self {
        let span: String = span.chars().take(120).collect();
        Self {
            message: message.into(),
            offset,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("citation grammar stopped after {consumed} of {total} characters")]
    Parse { consumed: usize, total: usize },
    #[error("invalid citation grammar at line {line}: {message}")]
    Grammar { line: usize, message: String },
}

/// A citation whose target could not be determined. Never propagated past
/// the resolver; the span is kept as plain text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolved citation {text:?}: {reason}")]
pub struct UnresolvedCitation {
    pub text: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("{sfs_id} has been revoked (revocation date {revoked_on:?})")]
    Revoked {
        sfs_id: String,
        revoked_on: Option<NaiveDate>,
    },
    #[error("document is not applicable: {reason}")]
    NotApplicable { reason: String },
    #[error(transparent)]
    Structural(#[from] StructuralParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Cursor(#[from] CursorError),
}

impl DocumentError {
    /// Short-circuits are designed outcomes rather than failures.
    pub fn is_short_circuit(&self) -> bool {
        matches!(
            self,
            DocumentError::Revoked { .. } | DocumentError::NotApplicable { .. }
        )
    }
}
