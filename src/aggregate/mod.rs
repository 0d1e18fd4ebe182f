//! Aggregates computed over the current selection: frequency tree,
//! calendar histogram, summary statistics, and temporal facts.

pub mod calendar;
pub mod facts;
pub mod stats;
pub mod tree;

pub use calendar::{CalendarHistogram, DayCount};
pub use facts::TemporalFacts;
pub use stats::Statistics;
pub use tree::{FrequencyTree, NodeKind, TreeNode};
