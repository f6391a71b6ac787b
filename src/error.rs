//! Application error type.
//!
//! Per-well fit failures are *statuses* (`domain::FitStatus`), not errors;
//! `AppError` is reserved for problems that stop a run or a file: bad
//! arguments, unreadable/malformed input, strict-layout violations, and
//! summaries that cannot be computed.

/// Error category, mapped to a stable process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or unusable paths.
    Usage,
    /// Malformed or unreadable input file (assay or plate template).
    Load,
    /// A well present in assay data has no layout entry under strict mode.
    Layout,
    /// Summarization cannot proceed (e.g. reference strain has no usable wells).
    InsufficientData,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage | ErrorKind::Load => 2,
            ErrorKind::Layout => 3,
            ErrorKind::InsufficientData => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn layout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Layout, message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientData, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
