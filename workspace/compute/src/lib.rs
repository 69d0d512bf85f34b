pub mod declarations;
pub mod error;
pub mod listing;
pub mod reconcile;
pub mod schedule;

pub use declarations::{
    GenerationReport, effective_schedules, generate_for_active_customers, generate_tax_returns,
    preview_tax_returns,
};
pub use error::{ComputeError, Result};
pub use schedule::{DayOverflow, DeclarationSchedule, Frequency, ScheduleCalculator, TaxReturnDraft};
