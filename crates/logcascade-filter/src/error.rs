/// Errors raised at the directive boundary
///
/// Tree insertion and compilation never fail; only directive input coming
/// from a control panel or config can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("logger '{0}' has not been observed")]
    UnknownLogger(String),

    #[error("logger name '{0}' has no segments")]
    InvalidLoggerName(String),

    #[error("'{0}' is not a directive class")]
    InvalidDirectiveClass(String),
}
