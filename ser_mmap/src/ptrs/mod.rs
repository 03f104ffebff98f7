//! Pointers: plain boxes, optionals, shared and back references, and
//! transient values.

mod header;
mod option;
mod ptr;
mod shared;
mod transient;

pub use header::PointeeHeader;
pub use option::MappedOption;
pub use ptr::MappedPtr;
pub use shared::{Back, Shared};
pub use transient::{MappedTransient, Transient};
