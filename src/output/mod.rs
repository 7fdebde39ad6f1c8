//! Storage of accepted samples.

mod sink;

pub use sink::{DiskSink, MemorySink, OutputSink, SampleName, SinkError};
