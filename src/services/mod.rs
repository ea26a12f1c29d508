//! Narrow interfaces to the external tabular store.

pub mod record_store;

pub use record_store::{DiscardSink, RecordSink, RecordSource, WriteSummary};
