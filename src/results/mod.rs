pub mod accumulator;
pub mod key;
pub mod store;

pub use self::accumulator::{Accumulator, Sample, NFE};
pub use self::key::ResultKey;
pub use self::store::ResultStore;
