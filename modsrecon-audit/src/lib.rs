//! modsrecon-audit library interface
//!
//! Reconciles legacy MODS documents against the copies served by the live
//! platform and reports every object whose fields drifted.
//!
//! - [`decoder`]: MODS → canonical field record
//! - [`comparator`]: per-object field comparison
//! - [`report`]: shared CSV mismatch report
//! - [`services`]: directory scan, live fetch, node id resolution
//! - [`pipeline`]: bounded concurrent audit run
//! - [`survey`]: element path survey over a MODS directory

pub mod comparator;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod services;
pub mod survey;

pub use crate::comparator::{compare, FieldMismatch, Reconciliation, ReportRow};
pub use crate::decoder::{DecodeError, DecodeWarning, DecodedRecord, ModsDecoder};
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::pipeline::{AuditPipeline, AuditSummary, ObjectOutcome, SkipReason};
pub use crate::report::{ReportError, ReportWriter};
