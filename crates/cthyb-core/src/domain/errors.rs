use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SolverResult<T> = Result<T, SolverError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverErrorCategory {
    Success,
    ConfigurationError,
    NumericalError,
    EngineFailure,
    InternalError,
}

impl SolverErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::ConfigurationError => 2,
            Self::NumericalError => 4,
            Self::EngineFailure => 5,
            Self::InternalError => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ConfigurationError => "ConfigurationError",
            Self::NumericalError => "NumericalError",
            Self::EngineFailure => "EngineFailure",
            Self::InternalError => "InternalError",
        }
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

/// Fatal error raised by the solver core.
///
/// Warnings (tail-decay violations, default fit windows) are never carried
/// through this type; they go through the `DiagnosticReporter` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverError {
    category: SolverErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl SolverError {
    pub fn new(
        category: SolverErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SolverErrorCategory::ConfigurationError, placeholder, message)
    }

    pub fn numerical(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SolverErrorCategory::NumericalError, placeholder, message)
    }

    pub fn engine_failure(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SolverErrorCategory::EngineFailure, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(SolverErrorCategory::InternalError, placeholder, message)
    }

    pub const fn category(&self) -> SolverErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

impl Display for SolverError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for SolverError {}
