//! Deadline-aware I/O for blocking streams
//!
//! This module provides:
//! - `DeadlineRead` / `DeadlineWrite` capability traits and `NopDeadline` adapter
//! - Deadline impls for std TCP and unix sockets
//! - `CopyOperation` for cancellable unidirectional copy
//! - `BidirectionalCopy` for splicing two duplex endpoints

mod adapter;
mod bidirectional;
mod copy;
mod deadline;
pub mod error;
mod net;

pub use adapter::{NopDeadline, nop_deadline_reader, nop_deadline_writer};
pub use bidirectional::{BidirectionalCopy, SpliceTotals, copy_full_duplex, splice};
pub use copy::{CopyOperation, copy};
pub use deadline::{DeadlineRead, DeadlineReadWrite, DeadlineWrite};
pub use error::{CopyError, CopyErrorKind};
