use std::error::Error;
use std::fmt::Display;

use crate::bitmap::BitmapHandle;
use crate::cel::CelType;
use crate::resource::ResourceType;

/// Everything that can stop a cel from being built or drawn.
///
/// All variants are fatal for the operation that produced them: drawing cannot go
/// on without the resource data. Each carries enough of the resource identity to
/// find the offending data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CelError {
    /// The cel cache has not been set up with `CelContext::init`.
    NotInitialized,
    InvalidConfig(&'static str),
    ResourceNotFound {
        kind: ResourceType,
        id: u16,
    },
    UnsupportedCompression {
        id: u16,
        loop_no: i16,
        cel_no: i16,
        compression: u8,
    },
    InvalidCacheIndex(usize),
    CacheTypeMismatch {
        slot: usize,
        expected: CelType,
    },
    NegativeLoop {
        id: u16,
        loop_no: i16,
    },
    NegativeCel {
        id: u16,
        cel_no: i16,
    },
    CelOutOfRange {
        id: u16,
        cel_no: i16,
        cel_count: u8,
    },
    /// A script asked for the cel count of the loop one past the last one.
    LoopEqualsCount {
        id: u16,
        loop_no: i16,
    },
    /// A field or pixel block lies (partly) outside its byte buffer.
    Truncated {
        what: &'static str,
        offset: usize,
        len: usize,
    },
    /// A compressed cel is wider than the row decoder's scratch buffer.
    RowTooWide {
        width: i32,
    },
    BitmapNotFound(BitmapHandle),
    PixelOutOfBounds {
        x: u16,
        y: u16,
    },
    UnsupportedOperation(&'static str),
}

impl Display for CelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "cel cache used before initialisation"),
            Self::InvalidConfig(reason) => write!(f, "invalid render configuration: {reason}"),
            Self::ResourceNotFound { kind, id } => write!(f, "{kind} resource {id} not found"),
            Self::UnsupportedCompression {
                id,
                loop_no,
                cel_no,
                compression,
            } => write!(
                f,
                "compression type {compression} of resource {id} (loop {loop_no}, cel {cel_no}) is not supported"
            ),
            Self::InvalidCacheIndex(index) => write!(f, "invalid cel cache index {index}"),
            Self::CacheTypeMismatch { slot, expected } => {
                write!(f, "expected a {expected} cel in cache slot {slot}")
            }
            Self::NegativeLoop { id, loop_no } => {
                write!(f, "loop {loop_no} of view {id} is less than 0")
            }
            Self::NegativeCel { id, cel_no } => write!(f, "cel {cel_no} of view {id} is less than 0"),
            Self::CelOutOfRange {
                id,
                cel_no,
                cel_count,
            } => write!(
                f,
                "cel number {cel_no} greater than cel count {cel_count} in pic {id}"
            ),
            Self::LoopEqualsCount { id, loop_no } => write!(
                f,
                "loop number {loop_no} is equal to loop count in view {id}"
            ),
            Self::Truncated { what, offset, len } => {
                write!(f, "{what} at offset {offset} runs past the end of {len} bytes")
            }
            Self::RowTooWide { width } => {
                write!(f, "compressed cel row of {width} pixels does not fit the decoder")
            }
            Self::BitmapNotFound(handle) => write!(f, "bitmap {handle} not found"),
            Self::PixelOutOfBounds { x, y } => write!(f, "pixel ({x}, {y}) is outside the cel"),
            Self::UnsupportedOperation(operation) => write!(f, "unsupported method: {operation}"),
        }
    }
}

impl Error for CelError {}
