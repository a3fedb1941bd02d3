//! View resources: animation loops of cels.
//!
//! | Offset | Size | Field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 2    | header size (loop headers follow at +2)|
//! | 2      | 1    | loop count                             |
//! | 5      | 1    | size flag                              |
//! | 8      | 4    | hunk palette offset                    |
//! | 12     | 1    | loop header size                       |
//! | 13     | 1    | cel header size                        |
//! | 14     | 2    | x resolution                           |
//! | 16     | 2    | y resolution                           |
//!
//! A loop header starts with a signed alternate loop index. Anything other than -1
//! redirects to that loop, mirrored when the next byte is 1. Byte 2 is the cel count
//! and the u32 at 12 the offset of the first cel header.

use crate::bitmap::BitmapStore;
use crate::config::{CelCountCompat, LOW_RES_X, LOW_RES_Y};
use crate::error::CelError;
use crate::rect::Point;
use crate::remap::RemapRange;
use crate::resource::{ByteView, ResourceData};

use super::{
    CelHeader, CelInfo, CelKind, CelObj, Compression, nonzero_or, resolution_from_size_flag,
};

const NO_ALTERNATE_LOOP: i8 = -1;

/// Offset of the header of loop `loop_no`.
fn loop_header_offset(data: &ByteView<'_>, loop_no: usize) -> Result<usize, CelError> {
    let header_size = usize::from(data.u16_at(0)?);
    let loop_header_size = usize::from(data.u8_at(12)?);
    Ok(2 + header_size + loop_header_size * loop_no)
}

/// The header of loop `loop_no` after alternate-loop redirection, and whether the
/// redirection mirrors it.
fn resolve_loop(data: &ByteView<'_>, loop_no: usize) -> Result<(usize, bool), CelError> {
    let header = loop_header_offset(data, loop_no)?;
    let alternate = data.i8_at(header)?;
    if alternate == NO_ALTERNATE_LOOP {
        return Ok((header, false));
    }

    let mirrored = data.u8_at(header + 1)? == 1;
    let alternate = usize::try_from(alternate).map_err(|_| CelError::NegativeLoop {
        id: 0,
        loop_no: i16::from(alternate),
    })?;
    Ok((loop_header_offset(data, alternate)?, mirrored))
}

/// Builds the cel `info` names out of view `data`.
///
/// Loop and cel numbers past the end are clamped to the last one; the returned
/// cel's `info` holds the clamped numbers.
///
/// # Errors
///
/// Fails on negative loop or cel numbers, on an unknown compression type and on
/// data too short for the headers it declares.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn parse(data: ResourceData, info: CelInfo, remap_range: RemapRange) -> Result<CelObj, CelError> {
    let bytes = data.view();
    let id = info.resource_id;
    let mut info = info;

    let loop_count = i16::from(bytes.u8_at(2)?);
    if info.loop_no >= loop_count {
        info.loop_no = loop_count - 1;
    }
    if info.loop_no < 0 {
        return Err(CelError::NegativeLoop {
            id,
            loop_no: info.loop_no,
        });
    }

    let (loop_header, mirror_x) = resolve_loop(&bytes, info.loop_no as usize).map_err(|err| match err {
        CelError::NegativeLoop { loop_no, .. } => CelError::NegativeLoop { id, loop_no },
        other => other,
    })?;

    let cel_count = i16::from(bytes.u8_at(loop_header + 2)?);
    if info.cel_no >= cel_count {
        info.cel_no = cel_count - 1;
    }
    if info.cel_no < 0 {
        return Err(CelError::NegativeCel {
            id,
            cel_no: info.cel_no,
        });
    }

    let cel_header_size = usize::from(bytes.u8_at(13)?);
    let cel_header_offset = bytes.offset_at(loop_header + 12)? + cel_header_size * info.cel_no as usize;
    let header = CelHeader::read(&bytes, cel_header_offset)?;

    let compression =
        Compression::from_byte(header.compression).ok_or(CelError::UnsupportedCompression {
            id,
            loop_no: info.loop_no,
            cel_no: info.cel_no,
            compression: header.compression,
        })?;

    let (mut x_resolution, mut y_resolution) = (bytes.u16_at(14)?, bytes.u16_at(16)?);
    if x_resolution == 0 && y_resolution == 0 {
        (x_resolution, y_resolution) = resolution_from_size_flag(u16::from(bytes.u8_at(5)?));
    }

    let hunk_palette_offset = bytes.offset_at(8)?;
    let width = header.width;
    let height = header.height;

    let mut cel = CelObj {
        info,
        width,
        height,
        origin: Point::new(
            i32::from(width / 2) - i32::from(header.displace_x),
            i32::from(height) - i32::from(header.displace_y),
        ),
        x_resolution: nonzero_or(x_resolution, LOW_RES_X),
        y_resolution: nonzero_or(y_resolution, LOW_RES_Y),
        skip_color: header.skip_color,
        compression,
        transparent: true,
        remap: false,
        mirror_x,
        cel_header_offset,
        hunk_palette_offset,
        kind: CelKind::View { data },
    };

    match header.flags {
        Some((transparent, remap)) => {
            cel.transparent = transparent;
            cel.remap = remap;
        }
        None => {
            let bitmaps = BitmapStore::new();
            let source = cel.source(&bitmaps)?;
            cel.remap = cel.uses_remap_colors(&source, remap_range)?;
        }
    }

    Ok(cel)
}

/// Number of loops in view `data`.
///
/// # Errors
///
/// Fails if the resource is shorter than its header.
pub fn loop_count(data: &ResourceData) -> Result<u8, CelError> {
    data.view().u8_at(2)
}

/// Number of cels in loop `loop_no` of view `id`.
///
/// Loops past the end or below zero have no cels. Asking for the loop one past the
/// last one is answered according to `compat`.
///
/// # Errors
///
/// Fails with [`CelError::LoopEqualsCount`] under [`CelCountCompat::Error`] and on
/// truncated data.
#[allow(clippy::cast_sign_loss)]
pub fn cel_count(
    data: &ResourceData,
    id: u16,
    loop_no: i16,
    compat: CelCountCompat,
) -> Result<i16, CelError> {
    let bytes = data.view();
    let loop_count = i16::from(bytes.u8_at(2)?);

    let loop_no = if loop_no == loop_count {
        match compat {
            CelCountCompat::Error => {
                tracing::error!("loop number {loop_no} is equal to loop count in view {id}");
                return Err(CelError::LoopEqualsCount { id, loop_no });
            }
            CelCountCompat::FirstLoop => {
                tracing::warn!("view {id}: cel count asked for loop {loop_no}, answering with loop 0");
                0
            }
            CelCountCompat::LastLoop => {
                tracing::warn!(
                    "view {id}: cel count asked for loop {loop_no}, answering with loop {}",
                    loop_count - 1
                );
                loop_count - 1
            }
        }
    } else {
        loop_no
    };

    if loop_no < 0 || loop_no >= loop_count {
        return Ok(0);
    }

    let (header, _) = resolve_loop(&bytes, loop_no as usize)?;
    Ok(i16::from(bytes.u8_at(header + 2)?))
}
