use crate::error::CelError;
use crate::resource::ByteView;

/// Size of the compressed reader's row scratch buffer. Wider cels cannot be decoded.
pub const MAX_ROW_WIDTH: usize = 1024;

const RUN_FLAG: u8 = 0x80;
const SKIP_RUN_FLAG: u8 = 0x40;
const RUN_LENGTH_MASK: u8 = 0x3F;

/// Where a cel's pixels live: the bytes holding its header and the header offset.
#[derive(Debug, Clone, Copy)]
pub struct PixelSource<'a> {
    pub data: ByteView<'a>,
    pub header_offset: usize,
    pub width: usize,
    pub height: usize,
    pub skip_color: u8,
}

impl PixelSource<'_> {
    fn header_field(&self, field: usize) -> Result<usize, CelError> {
        self.data.offset_at(self.header_offset + field)
    }
}

/// Produces decoded source rows.
pub trait Reader {
    /// Row `y` of the cel. Only the first `max_width` pixels are guaranteed to be
    /// decoded.
    fn row(&mut self, y: usize) -> &[u8];
}

/// Rows of a cel stored as plain pixels, `width` bytes per row.
pub struct Uncompressed<'a> {
    pixels: &'a [u8],
    width: usize,
}

impl<'a> Uncompressed<'a> {
    /// # Errors
    ///
    /// Fails if the pixel block does not fit the source bytes.
    pub fn new(source: &PixelSource<'a>) -> Result<Self, CelError> {
        let offset = source.header_field(24)?;
        let pixels = source
            .data
            .slice("uncompressed pixels", offset, source.width * source.height)?;

        Ok(Self {
            pixels,
            width: source.width,
        })
    }

    /// Every pixel of the cel, row after row.
    #[must_use]
    pub const fn all_pixels(&self) -> &'a [u8] {
        self.pixels
    }
}

impl Reader for Uncompressed<'_> {
    fn row(&mut self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.pixels[start..start + self.width]
    }
}

/// Rows of a run-length compressed cel, decoded one at a time.
///
/// Each row is described by two streams: control bytes at
/// `data_offset + table[y]` and literal pixels at
/// `literal_offset + table[height + y]`. A control byte with the high bit clear copies
/// that many literal bytes. With the high bit set the low six bits are a run length:
/// the run is the skip colour if bit 6 is set, otherwise one literal byte repeated.
pub struct Compressed<'a> {
    bytes: &'a [u8],
    table: ByteView<'a>,
    data_offset: usize,
    literal_offset: usize,
    height: usize,
    skip_color: u8,
    max_width: usize,
    last_row: Option<usize>,
    buffer: [u8; MAX_ROW_WIDTH],
}

impl<'a> Compressed<'a> {
    /// A reader that decodes `max_width` pixels of every row.
    ///
    /// # Errors
    ///
    /// Fails when the row offset table does not fit the source or the rows are
    /// wider than [`MAX_ROW_WIDTH`].
    pub fn new(source: &PixelSource<'a>, max_width: usize) -> Result<Self, CelError> {
        if max_width > MAX_ROW_WIDTH {
            return Err(CelError::RowTooWide {
                width: i32::try_from(max_width).unwrap_or(i32::MAX),
            });
        }

        let data_offset = source.header_field(24)?;
        let literal_offset = source.header_field(28)?;
        let control_offset = source.header_field(32)?;
        let table = source
            .data
            .slice("row offset table", control_offset, source.height * 8)?;

        Ok(Self {
            bytes: source.data.bytes(),
            table: ByteView::new(table, source.data.endian()),
            data_offset,
            literal_offset,
            height: source.height,
            skip_color: source.skip_color,
            max_width,
            last_row: None,
            buffer: [0; MAX_ROW_WIDTH],
        })
    }

    fn table_entry(&self, index: usize) -> usize {
        self.table.offset_at(index * 4).unwrap_or(0)
    }

    fn decode(&mut self, y: usize) {
        let bytes = self.bytes;
        let control_start = self.data_offset + self.table_entry(y);
        let literal_start = self.literal_offset + self.table_entry(self.height + y);

        let mut control = bytes.get(control_start..).unwrap_or_default().iter();
        let mut literal = bytes.get(literal_start..).unwrap_or_default();

        let mut i = 0;
        while i < self.max_width {
            let Some(&control_byte) = control.next() else {
                break;
            };

            let length;
            if control_byte & RUN_FLAG == 0 {
                length = usize::from(control_byte);
                let count = length.min(literal.len()).min(MAX_ROW_WIDTH - i);
                self.buffer[i..i + count].copy_from_slice(&literal[..count]);
                literal = &literal[length.min(literal.len())..];
            } else {
                length = usize::from(control_byte & RUN_LENGTH_MASK);
                let end = (i + length).min(MAX_ROW_WIDTH);
                if control_byte & SKIP_RUN_FLAG == 0 {
                    let Some((&color, rest)) = literal.split_first() else {
                        break;
                    };
                    self.buffer[i..end].fill(color);
                    literal = rest;
                } else {
                    self.buffer[i..end].fill(self.skip_color);
                }
            }

            // A zero length run never advances.
            if length == 0 {
                break;
            }
            i += length;
        }

        // Truncated rows read as transparent.
        if i < self.max_width {
            self.buffer[i..self.max_width].fill(self.skip_color);
        }

        self.last_row = Some(y);
    }
}

impl Reader for Compressed<'_> {
    fn row(&mut self, y: usize) -> &[u8] {
        if self.last_row != Some(y) {
            self.decode(y);
        }
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::SciEndian;
    use crate::testing::compressed_cel;
    use pretty_assertions::assert_eq;

    const SKIP: u8 = 0xFF;

    /// Straightforward interpreter of the control-byte rules, used as the reference.
    fn reference_decode(control: &[u8], literal: &[u8], skip: u8) -> Vec<u8> {
        let mut out = Vec::new();
        let mut literal = literal.iter();
        for &byte in control {
            if byte & 0x80 == 0 {
                for _ in 0..byte {
                    out.push(*literal.next().unwrap());
                }
            } else {
                let length = byte & 0x3F;
                let color = if byte & 0x40 == 0 {
                    *literal.next().unwrap()
                } else {
                    skip
                };
                out.extend(std::iter::repeat_n(color, usize::from(length)));
            }
        }
        out
    }

    fn decode_row(control: &[u8], literal: &[u8], width: usize, max_width: usize) -> Vec<u8> {
        let bytes = compressed_cel(width, &[(control.to_vec(), literal.to_vec())], SKIP);
        let source = PixelSource {
            data: ByteView::new(&bytes, SciEndian::Little),
            header_offset: 0,
            width,
            height: 1,
            skip_color: SKIP,
        };
        let mut reader = Compressed::new(&source, max_width).unwrap();
        reader.row(0)[..max_width].to_vec()
    }

    #[test]
    fn all_literal_row() {
        let control = [4];
        let literal = [1, 2, 3, 4];
        assert_eq!(
            decode_row(&control, &literal, 4, 4),
            reference_decode(&control, &literal, SKIP)
        );
    }

    #[test]
    fn all_skip_run_row() {
        let control = [0xC0 | 6];
        assert_eq!(decode_row(&control, &[], 6, 6), vec![SKIP; 6]);
        assert_eq!(
            decode_row(&control, &[], 6, 6),
            reference_decode(&control, &[], SKIP)
        );
    }

    #[test]
    fn all_fill_run_row() {
        let control = [0x80 | 5];
        let literal = [9];
        assert_eq!(decode_row(&control, &literal, 5, 5), vec![9; 5]);
    }

    #[test]
    fn mixed_row_stops_at_max_width() {
        // literal 2, skip run 3, fill run 4, literal 3 = 12 pixels
        let control = [2, 0xC0 | 3, 0x80 | 4, 3];
        let literal = [1, 2, 7, 4, 5, 6];
        let reference = reference_decode(&control, &literal, SKIP);
        assert_eq!(reference.len(), 12);

        assert_eq!(decode_row(&control, &literal, 12, 12), reference);

        // The limit falls in the middle of the fill run: decoding stops after that run.
        let partial = decode_row(&control, &literal, 12, 7);
        assert_eq!(partial.as_slice(), &reference[..7]);
    }

    #[test]
    fn rows_are_cached() {
        let rows = vec![(vec![2], vec![1, 2]), (vec![0x80 | 2], vec![5])];
        let bytes = compressed_cel(2, &rows, SKIP);
        let source = PixelSource {
            data: ByteView::new(&bytes, SciEndian::Little),
            header_offset: 0,
            width: 2,
            height: 2,
            skip_color: SKIP,
        };
        let mut reader = Compressed::new(&source, 2).unwrap();
        assert_eq!(&reader.row(1)[..2], &[5, 5]);
        assert_eq!(reader.last_row, Some(1));
        assert_eq!(&reader.row(0)[..2], &[1, 2]);
        assert_eq!(&reader.row(0)[..2], &[1, 2]);
    }

    #[test]
    fn too_wide_rows_are_rejected() {
        let bytes = compressed_cel(1, &[(vec![0xC1], vec![])], SKIP);
        let source = PixelSource {
            data: ByteView::new(&bytes, SciEndian::Little),
            header_offset: 0,
            width: 2000,
            height: 1,
            skip_color: SKIP,
        };
        assert_eq!(
            Compressed::new(&source, 2000).err(),
            Some(CelError::RowTooWide { width: 2000 })
        );
    }

    #[test]
    fn uncompressed_rows() {
        let mut bytes = vec![0; 40];
        bytes[24..28].copy_from_slice(&40u32.to_le_bytes());
        bytes.extend([1, 2, 3, 4, 5, 6]);
        let source = PixelSource {
            data: ByteView::new(&bytes, SciEndian::Little),
            header_offset: 0,
            width: 3,
            height: 2,
            skip_color: 0,
        };
        let mut reader = Uncompressed::new(&source).unwrap();
        assert_eq!(reader.row(1), &[4, 5, 6]);

        let short = PixelSource { height: 3, ..source };
        assert!(Uncompressed::new(&short).is_err());
    }
}
