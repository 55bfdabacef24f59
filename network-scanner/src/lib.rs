pub mod aggregate;
pub mod scan;
pub mod store;

pub use scan::{NetworkScanner, ScanOutcome};
pub use store::ResultStore;
