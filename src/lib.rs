pub mod builder;
pub mod matrix;
pub mod metadata;

mod codec;
mod ec;
mod mask;
mod utils;

pub use builder::{QRBuilder, QR};
pub use mask::MaskPattern;
pub use matrix::{Compression, QRMatrix};
pub use metadata::{ECLevel, Eci, Version};
pub use utils::{QRError, QRResult};
