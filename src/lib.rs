pub mod aggregate;
pub mod config;
pub mod donate;
pub mod error;
pub mod explorer;
pub mod facet;
pub mod page;
pub mod selection;
pub mod store;

pub use aggregate::{CalendarHistogram, FrequencyTree, Statistics, TemporalFacts};
pub use config::{ExploreConfig, TableConfig};
pub use donate::{DonationPayload, DonationSink};
pub use error::{ExploreError, ExploreResult};
pub use explorer::{explorer_for, DeleteOutcome, Explorer};
pub use facet::{DateRange, FacetKind, FacetState, KeySet, TextQuery};
pub use page::{DeleteConfig, DeleteFlow, DeletePhase};
pub use selection::Selection;
pub use store::{MemoryStore, Record, RowStore};
