/// Process-boundary error: a user-facing message plus the exit code the
/// binary should terminate with.
///
/// Exit codes: `3` for data problems (empty, non-finite, or underdetermined
/// input), `4` for numeric or terminal failures (fit did not converge, TUI
/// could not start).
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
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
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Errors produced by the curve-fitting core.
///
/// `Underdetermined` and `NonFiniteData` reject bad inputs before any
/// iteration runs. The remaining variants mean the solver gave up; no retry
/// is attempted and the caller must supply a better initial guess.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FitError {
    #[error("dataset has {actual} points but the model has {required} free parameters")]
    Underdetermined { actual: usize, required: usize },

    #[error("non-finite value in input data at index {index}")]
    NonFiniteData { index: usize },

    #[error("model is not finite at the initial guess")]
    NonFiniteAtGuess,

    #[error("Jacobian is rank-deficient; no finite least-squares step exists")]
    SingularJacobian,

    #[error("no convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
}

impl FitError {
    /// True when the iteration itself failed, as opposed to inputs that were
    /// rejected up front.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteAtGuess | Self::SingularJacobian | Self::NoConvergence { .. }
        )
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = if err.is_convergence_failure() { 4 } else { 3 };
        AppError::new(exit_code, err.to_string())
    }
}
