pub mod partial;
pub mod record;

pub use partial::PartialRecord;
pub use record::{Dimension, Record, Resize, SessionKey};
