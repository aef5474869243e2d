pub mod aggregator;
pub mod engine;
pub mod normalizer;
pub mod report;
pub mod session;
pub mod variance;

pub use engine::reconcile;
pub use session::{Session, StocktakeService};
