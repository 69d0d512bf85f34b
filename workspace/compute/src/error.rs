use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A declaration schedule has a field outside its allowed range
    #[error("Invalid schedule for '{declaration_type}': {reason}")]
    InvalidSchedule {
        declaration_type: String,
        reason: String,
    },

    /// A yearly declaration has no due month and no catalog default
    #[error("Yearly declaration '{0}' has no due month")]
    MissingDueMonth(String),

    /// The due day does not exist in the due month and overflow is rejected
    #[error("Due day {day} does not exist in {year}-{month:02} for '{declaration_type}'")]
    InvalidDueDay {
        declaration_type: String,
        day: u32,
        year: i32,
        month: u32,
    },

    /// A due date falls after January of the following year
    #[error("Due date {due_date} of '{declaration_type}' {period} is outside the scheduling window")]
    OutsideSchedulingWindow {
        declaration_type: String,
        period: String,
        due_date: chrono::NaiveDateTime,
    },

    /// The same id appears twice in a desired collection
    #[error("Item id {0} appears more than once")]
    DuplicateItem(i32),

    /// Paging or sorting parameters cannot be applied
    #[error("Invalid list query: {0}")]
    InvalidListQuery(String),

    /// A referenced record does not exist
    #[error("{entity} with id {id} does not exist")]
    NotFound { entity: &'static str, id: i32 },
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
