pub mod goalkeeper;
mod node;

pub use self::goalkeeper::*;
pub use self::node::*;
