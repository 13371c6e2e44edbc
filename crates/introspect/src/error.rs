use strata_orm::OrmError;
use thiserror::Error;

pub type IntrospectResult<T> = Result<T, IntrospectError>;

#[derive(Debug, Error)]
pub enum IntrospectError {
    #[error(transparent)]
    Orm(#[from] OrmError),

    /// Foreign keys form a cycle, so no creation order exists
    #[error("Circular foreign key dependency: {}", .tables.join(" -> "))]
    CircularDependency { tables: Vec<String> },

    #[error("Table '{0}' not found")]
    TableNotFound(String),
}
