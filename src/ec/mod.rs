mod encoder;
mod galois;

pub(crate) use encoder::*;
pub(crate) use galois::*;

pub(crate) static MAX_BLOCK_SIZE: usize = 256;

pub(crate) static MAX_EC_SIZE: usize = 30;
