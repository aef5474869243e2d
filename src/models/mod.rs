pub mod feed;
pub mod observation;
pub mod report;

pub use feed::{InventorySnapshotEntry, ProductMasterEntry};
pub use observation::{
    CountSheet, ImportRow, Observation, RowUpdate, SheetKind, SheetSummary, SpreadsheetImport,
};
pub use report::{AggregatedQuantity, ReconReport, ReconSummary, UnmatchedObservation, VarianceRow};
