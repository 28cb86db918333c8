pub mod accounting;
pub mod consumer;
pub mod convert;
pub mod emit;
pub mod error;
pub mod pump;
pub mod record;

pub use accounting::{Accounting, WindowReport};
pub use consumer::{Options, RunSummary, consume, run};
pub use convert::{convert_message, normalize};
pub use emit::Emitter;
pub use error::PipelineError;
pub use pump::{Delivery, MAX_CONSECUTIVE_ERRORS, PumpSummary, run_pump, spawn_pump};
pub use record::{Batch, FieldValue, InterpretedField, InterpretedRecord};
