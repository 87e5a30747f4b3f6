use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    /// The script transform could not make sense of its input.
    #[error("script error: {0}")]
    Script(String),

    /// The markup renderer hit a construct it cannot render.
    #[error("markup error: {0}")]
    Markup(String),

    /// The stylesheet compiler hit malformed or unsupported input.
    #[error("stylesheet error: {0}")]
    Stylesheet(String),
}
