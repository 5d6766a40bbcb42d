//! Compound-state store
//!
//! A recursive keyed tree of typed values that backs type properties,
//! component definitions and persisted owner state. Children of a compound
//! iterate in sorted key order so encodings are reproducible. The binary
//! form is little-endian with length-prefixed strings; files are gzip'd.

mod compound;
mod io;
mod tag;

pub use compound::CompoundTag;
pub use io::{
    from_bytes, read_compound, read_gzip_file, to_bytes, write_compound, write_gzip_file,
};
pub use tag::{Tag, TagType};

use thiserror::Error;

/// Maximum nesting depth accepted by the decoder
pub const MAX_DEPTH: usize = 512;

/// Errors produced while decoding or encoding tag trees
#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unknown tag type {0}")]
    UnknownTagType(u8),

    #[error("unexpected end of data, expected {expected} more bytes")]
    UnexpectedEof { expected: usize },

    #[error("root tag must be a compound, found {0}")]
    InvalidRoot(&'static str),

    #[error("list holds {expected} tags, found {found}")]
    MixedList {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid length {0}")]
    InvalidLength(i32),

    #[error("invalid string payload: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("nesting depth {0} exceeds the limit")]
    DepthLimit(usize),
}

/// Result alias local to the store
pub type NbtResult<T> = Result<T, NbtError>;
