//! Domain types for Decorr

pub mod ids;
pub mod series;
pub mod universe;
pub mod window;

pub use ids::{AssetId, DatasetHash};
pub use series::{PriceSeries, SeriesSet};
pub use universe::Universe;
pub use window::{TimeWindow, WindowError};
