//! Pic resources: the layered cels of a background picture.
//!
//! | Offset | Size | Field                         |
//! |--------|------|-------------------------------|
//! | 0      | 2    | header size (cel headers follow) |
//! | 2      | 1    | cel count                     |
//! | 4      | 2    | cel header size               |
//! | 6      | 4    | hunk palette offset           |
//! | 10     | 2    | size flag, or x resolution    |
//! | 12     | 2    | 0, or y resolution            |
//!
//! Pic cel headers extend the view cel header with a priority at 36 and the cel
//! position relative to the picture at 38 and 40.

use std::sync::Arc;

use crate::config::{LOW_RES_X, LOW_RES_Y};
use crate::error::CelError;
use crate::rect::Point;
use crate::resource::{ResourceData, SciEndian};

use super::{CelHeader, CelInfo, CelKind, CelObj, Compression, nonzero_or, resolution_from_size_flag};

/// Builds cel `info.cel_no` of pic `data`.
///
/// # Errors
///
/// Fails when the cel number is outside the picture, on an unknown compression
/// type and on truncated data.
#[allow(clippy::cast_sign_loss)]
pub fn parse(data: ResourceData, info: CelInfo) -> Result<CelObj, CelError> {
    let bytes = data.view();
    let id = info.resource_id;

    let cel_count = bytes.u8_at(2)?;
    if info.cel_no < 0 {
        return Err(CelError::NegativeCel {
            id,
            cel_no: info.cel_no,
        });
    }
    if info.cel_no >= i16::from(cel_count) {
        tracing::error!("cel number {} greater than cel count {cel_count} in pic {id}", info.cel_no);
        return Err(CelError::CelOutOfRange {
            id,
            cel_no: info.cel_no,
            cel_count,
        });
    }

    let cel_header_offset =
        usize::from(bytes.u16_at(0)?) + usize::from(bytes.u16_at(4)?) * info.cel_no as usize;
    let header = CelHeader::read(&bytes, cel_header_offset)?;

    let compression =
        Compression::from_byte(header.compression).ok_or(CelError::UnsupportedCompression {
            id,
            loop_no: info.loop_no,
            cel_no: info.cel_no,
            compression: header.compression,
        })?;

    let (size_x, size_y) = (bytes.u16_at(10)?, bytes.u16_at(12)?);
    let (x_resolution, y_resolution) = if size_y == 0 {
        resolution_from_size_flag(size_x)
    } else {
        (size_x, size_y)
    };

    let priority = bytes.i16_at(cel_header_offset + 36)?;
    let relative_position = Point::new(
        i32::from(bytes.i16_at(cel_header_offset + 38)?),
        i32::from(bytes.i16_at(cel_header_offset + 40)?),
    );
    let hunk_palette_offset = bytes.offset_at(6)?;

    let mut cel = CelObj {
        info,
        width: header.width,
        height: header.height,
        origin: Point::new(i32::from(header.displace_x), i32::from(header.displace_y)),
        x_resolution: nonzero_or(x_resolution, LOW_RES_X),
        y_resolution: nonzero_or(y_resolution, LOW_RES_Y),
        skip_color: header.skip_color,
        compression,
        transparent: true,
        remap: false,
        mirror_x: false,
        cel_header_offset,
        hunk_palette_offset,
        kind: CelKind::Pic {
            data,
            priority,
            relative_position,
            cel_count,
        },
    };

    match header.flags {
        Some((transparent, remap)) => {
            cel.transparent = transparent;
            cel.remap = remap;
        }
        None if compression == Compression::None => {
            let bitmaps = crate::bitmap::BitmapStore::new();
            let source = cel.source(&bitmaps)?;
            cel.transparent = cel.has_skip_pixels(&source)?;
        }
        None => {}
    }

    Ok(cel)
}

/// Stand-in for a picture that is known to be missing from some releases: nothing
/// to draw and no cels.
#[must_use]
pub fn empty(info: CelInfo, endian: SciEndian) -> CelObj {
    CelObj {
        info,
        width: 0,
        height: 0,
        origin: Point::default(),
        x_resolution: LOW_RES_X,
        y_resolution: LOW_RES_Y,
        skip_color: 0,
        compression: Compression::None,
        transparent: false,
        remap: false,
        mirror_x: false,
        cel_header_offset: 0,
        hunk_palette_offset: 0,
        kind: CelKind::Pic {
            data: ResourceData::new(Arc::from(Vec::new()), endian),
            priority: 0,
            relative_position: Point::default(),
            cel_count: 0,
        },
    }
}
