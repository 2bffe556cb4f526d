pub mod batch;
pub mod record;

pub use batch::{decode_batch, decode_scored};
pub use record::{DecodeContext, FromRecord, RecordOutcome, RecordView, SkipReason, decode_record};
