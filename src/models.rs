mod kind;
mod outcome;
mod record;
mod view;

pub use kind::RecordKind;
pub use outcome::{DeleteOutcome, InsertOutcome, UpdateFields, UpdateOutcome};
pub use record::{Record, RecordBuilder};
pub use view::DataView;
