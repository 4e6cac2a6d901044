pub mod post;
pub mod version;

pub use post::*;
pub use version::*;
