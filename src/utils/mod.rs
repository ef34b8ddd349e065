pub mod bitstream;
pub mod error;
pub mod iter;

pub use bitstream::*;
pub use error::*;
pub use iter::*;
