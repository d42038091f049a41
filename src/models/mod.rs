pub mod filter;
pub mod item;
pub mod snapshot;

pub use filter::*;
pub use item::*;
pub use snapshot::*;
