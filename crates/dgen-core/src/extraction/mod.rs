//! Streaming extraction of the fenced diagram block.
//!
//! # Module Structure
//!
//! - `fence`: delimiter literals and the resumable scanner
//! - `batcher`: line batching inside the fence
//! - `session`: per-stream state machine driving both
//!
//! # Usage
//!
//! ```
//! use dgen_core::extraction::{ExtractionEvent, ExtractionSession, StreamOutcome};
//!
//! let mut session = ExtractionSession::new();
//! let mut events = session.feed("Here you go:\n```mermaid\ngraph TD\n");
//! events.extend(session.feed("A-->B\n```"));
//!
//! assert_eq!(events.first(), Some(&ExtractionEvent::Opened));
//! assert_eq!(session.payload(), "graph TD\nA-->B\n");
//! assert_eq!(session.finish(), StreamOutcome::Completed);
//! ```

mod batcher;
mod fence;
mod session;

pub use batcher::{LINE_BATCH_THRESHOLD, LineBatcher};
pub use fence::{CLOSING_DELIMITER, DelimiterScanner, OPENING_DELIMITER};
pub use session::{ExtractionEvent, ExtractionSession, FencePhase, StreamOutcome};
