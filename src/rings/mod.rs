pub mod basis;
pub mod errors;
pub mod poly;
pub mod traits;

pub use basis::{NttTable, RnsBasis};
pub use errors::{RingError, RingResult};
pub use poly::RnsPoly;
pub use traits::{PolyModSwitch, PolyRing, PolySampler};
