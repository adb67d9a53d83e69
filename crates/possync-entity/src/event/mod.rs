//! Events appended to the log by the point-of-sale application.

pub mod model;
pub mod payload;

pub use model::{Event, EventLineError, EventParseError};
pub use payload::{DocumentPosted, EventPayload, ProductUpdated, StockChanged};
