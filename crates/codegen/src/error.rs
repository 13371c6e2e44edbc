use thiserror::Error;

pub type CodegenResult<T> = Result<T, CodegenError>;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Invalid migration name '{0}': use letters, digits and underscores, starting with a letter")]
    InvalidName(String),
}
