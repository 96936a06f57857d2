//! Data module - CSV loading, cleaning and aggregation

mod cleaning;
mod loader;
mod processor;
mod records;
mod snapshot;

pub use cleaning::is_electric;
pub use processor::{CompositionShare, DataFilter, DataProcessor, FuelSeries};
pub use records::{CombinedAnnualRecord, Pm25Record, VehicleRecord};
pub use snapshot::DashboardData;
