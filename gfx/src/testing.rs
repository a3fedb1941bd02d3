//! Builders that synthesise view and pic resources byte for byte, in the layout the
//! cel parsers read. Used by the unit tests and the demo scene.
//!
//! Cels are described by their logical pixels; compressed cels are run-length
//! encoded on the way out, using all three kinds of control byte.

use crate::resource::SciEndian;

const CEL_HEADER_SIZE: usize = 42;
const VIEW_HEADER_SIZE: u16 = 16;
const LOOP_HEADER_SIZE: usize = 16;
const PIC_HEADER_SIZE: u16 = 14;

const MAX_LITERAL: usize = 0x7F;
const MAX_RUN: usize = 0x3F;

/// One cel of a synthetic resource.
#[derive(Debug, Clone)]
pub struct CelDef {
    pub width: u16,
    pub height: u16,
    pub pixels: Vec<u8>,
    pub compressed: bool,
    pub skip_color: u8,
    pub displace: (i16, i16),
    /// Explicit transparent/remap flags. Without them the parser derives both.
    pub flags: Option<(bool, bool)>,
    pub priority: i16,
    pub relative_position: (i16, i16),
    /// Stored compression byte, when it should not follow `compressed`.
    pub compression_override: Option<u8>,
}

impl CelDef {
    /// # Panics
    ///
    /// Panics if `pixels` does not hold `width * height` bytes.
    #[must_use]
    pub fn uncompressed(width: u16, height: u16, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), usize::from(width) * usize::from(height));
        Self {
            width,
            height,
            pixels,
            compressed: false,
            skip_color: 255,
            displace: (0, 0),
            flags: None,
            priority: 0,
            relative_position: (0, 0),
            compression_override: None,
        }
    }

    /// # Panics
    ///
    /// Panics if `pixels` does not hold `width * height` bytes.
    #[must_use]
    pub fn compressed(width: u16, height: u16, pixels: Vec<u8>) -> Self {
        Self {
            compressed: true,
            ..Self::uncompressed(width, height, pixels)
        }
    }

    #[must_use]
    pub const fn skip_color(mut self, skip_color: u8) -> Self {
        self.skip_color = skip_color;
        self
    }

    #[must_use]
    pub const fn displace(mut self, x: i16, y: i16) -> Self {
        self.displace = (x, y);
        self
    }

    #[must_use]
    pub const fn flags(mut self, transparent: bool, remap: bool) -> Self {
        self.flags = Some((transparent, remap));
        self
    }

    /// Pic placement: drawing priority and position relative to the picture.
    #[must_use]
    pub const fn placement(mut self, priority: i16, x: i16, y: i16) -> Self {
        self.priority = priority;
        self.relative_position = (x, y);
        self
    }

    #[must_use]
    pub const fn compression_byte(mut self, compression: u8) -> Self {
        self.compression_override = Some(compression);
        self
    }

    fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(usize::from(self.width).max(1))
    }
}

/// Run-length encodes one row into control and literal streams.
#[must_use]
pub fn encode_row(row: &[u8], skip_color: u8) -> (Vec<u8>, Vec<u8>) {
    let mut control = Vec::new();
    let mut literal = Vec::new();

    let mut i = 0;
    while i < row.len() {
        let color = row[i];
        let run = row[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&pixel| pixel == color)
            .count();

        if color == skip_color {
            control.push(0xC0 | run_byte(run));
            i += run;
        } else if run >= 3 {
            control.push(0x80 | run_byte(run));
            literal.push(color);
            i += run;
        } else {
            let start = i;
            while i < row.len() && i - start < MAX_LITERAL {
                let pixel = row[i];
                let repeats = row[i..].iter().take(3).take_while(|&&p| p == pixel).count();
                if pixel == skip_color || repeats >= 3 {
                    break;
                }
                i += 1;
            }
            control.push(run_byte(i - start));
            literal.extend_from_slice(&row[start..i]);
        }
    }

    (control, literal)
}

#[allow(clippy::cast_possible_truncation)]
const fn run_byte(length: usize) -> u8 {
    length as u8
}

#[allow(clippy::cast_possible_truncation)]
fn offset(value: usize) -> u32 {
    value as u32
}

/// Byte writer that follows one [`SciEndian`].
struct Writer {
    bytes: Vec<u8>,
    endian: SciEndian,
}

impl Writer {
    const fn new(endian: SciEndian) -> Self {
        Self {
            bytes: Vec::new(),
            endian,
        }
    }

    fn reserve(&mut self, len: usize) -> usize {
        let at = self.bytes.len();
        self.bytes.resize(at + len, 0);
        at
    }

    fn append(&mut self, data: &[u8]) -> usize {
        let at = self.bytes.len();
        self.bytes.extend_from_slice(data);
        at
    }

    fn u8_at(&mut self, at: usize, value: u8) {
        self.bytes[at] = value;
    }

    fn u16_at(&mut self, at: usize, value: u16) {
        let bytes = match self.endian {
            SciEndian::Little => value.to_le_bytes(),
            SciEndian::Big => value.to_be_bytes(),
        };
        self.bytes[at..at + 2].copy_from_slice(&bytes);
    }

    #[allow(clippy::cast_sign_loss)]
    fn i16_at(&mut self, at: usize, value: i16) {
        self.u16_at(at, value as u16);
    }

    fn u32_at(&mut self, at: usize, value: u32) {
        let bytes = match self.endian {
            SciEndian::Little => value.to_le_bytes(),
            SciEndian::Big => value.to_be_bytes(),
        };
        self.bytes[at..at + 4].copy_from_slice(&bytes);
    }

    /// Writes the cel header at `header` and appends the cel's pixel data.
    fn cel(&mut self, header: usize, cel: &CelDef) {
        self.u16_at(header, cel.width);
        self.u16_at(header + 2, cel.height);
        self.i16_at(header + 4, cel.displace.0);
        self.i16_at(header + 6, cel.displace.1);
        self.u8_at(header + 8, cel.skip_color);
        self.u8_at(
            header + 9,
            cel.compression_override.unwrap_or(u8::from(cel.compressed)),
        );
        if let Some((transparent, remap)) = cel.flags {
            let flags = 0x80 | u16::from(transparent) | (u16::from(remap) << 1);
            self.u16_at(header + 10, flags);
            // The marker bit is read from the byte at offset 10 whatever the order.
            self.u8_at(header + 10, self.bytes[header + 10] | 0x80);
        }
        self.i16_at(header + 36, cel.priority);
        self.i16_at(header + 38, cel.relative_position.0);
        self.i16_at(header + 40, cel.relative_position.1);

        if cel.compressed {
            let rows: Vec<_> = cel
                .rows()
                .map(|row| encode_row(row, cel.skip_color))
                .collect();
            self.compressed_streams(header, &rows);
        } else {
            let data = self.append(&cel.pixels);
            self.u32_at(header + 24, offset(data));
            self.u32_at(header + 28, offset(data));
            self.u32_at(header + 32, 0);
        }
    }

    fn compressed_streams(&mut self, header: usize, rows: &[(Vec<u8>, Vec<u8>)]) {
        let data = self.bytes.len();
        let mut control_offsets = Vec::with_capacity(rows.len());
        for (control, _) in rows {
            control_offsets.push(self.append(control) - data);
        }

        let literal = self.bytes.len();
        let mut literal_offsets = Vec::with_capacity(rows.len());
        for (_, pixels) in rows {
            literal_offsets.push(self.append(pixels) - literal);
        }

        let table = self.reserve(rows.len() * 8);
        for (i, value) in control_offsets.iter().chain(&literal_offsets).enumerate() {
            self.u32_at(table + i * 4, offset(*value));
        }

        self.u32_at(header + 24, offset(data));
        self.u32_at(header + 28, offset(literal));
        self.u32_at(header + 32, offset(table));
    }
}

/// A lone compressed cel with its header at offset 0, built from already encoded
/// rows.
#[must_use]
pub fn compressed_cel(width: usize, rows: &[(Vec<u8>, Vec<u8>)], skip_color: u8) -> Vec<u8> {
    let mut writer = Writer::new(SciEndian::Little);
    writer.reserve(CEL_HEADER_SIZE);
    writer.u16_at(0, u16::try_from(width).unwrap_or(u16::MAX));
    writer.u16_at(2, u16::try_from(rows.len()).unwrap_or(u16::MAX));
    writer.u8_at(8, skip_color);
    writer.u8_at(9, 1);
    writer.compressed_streams(0, rows);
    writer.bytes
}

#[derive(Debug, Clone)]
enum LoopDef {
    Cels(Vec<CelDef>),
    Mirror(i8),
}

/// Synthesises a view resource.
#[derive(Debug, Clone)]
pub struct ViewBuilder {
    loops: Vec<LoopDef>,
    size_flag: u8,
    resolution: (u16, u16),
    palette: Option<Vec<u8>>,
    endian: SciEndian,
}

impl Default for ViewBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            loops: Vec::new(),
            size_flag: 0,
            resolution: (0, 0),
            palette: None,
            endian: SciEndian::Little,
        }
    }

    #[must_use]
    pub fn add_loop(mut self, cels: Vec<CelDef>) -> Self {
        self.loops.push(LoopDef::Cels(cels));
        self
    }

    /// A loop that shows loop `of` mirrored.
    #[must_use]
    pub fn add_mirrored_loop(mut self, of: i8) -> Self {
        self.loops.push(LoopDef::Mirror(of));
        self
    }

    /// Explicit resolution. Left at 0x0 the size flag decides.
    #[must_use]
    pub const fn resolution(mut self, x: u16, y: u16) -> Self {
        self.resolution = (x, y);
        self
    }

    #[must_use]
    pub const fn size_flag(mut self, size_flag: u8) -> Self {
        self.size_flag = size_flag;
        self
    }

    #[must_use]
    pub fn palette(mut self, palette: Vec<u8>) -> Self {
        self.palette = Some(palette);
        self
    }

    #[must_use]
    pub const fn endian(mut self, endian: SciEndian) -> Self {
        self.endian = endian;
        self
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn build(&self) -> Vec<u8> {
        let mut writer = Writer::new(self.endian);
        writer.reserve(2 + usize::from(VIEW_HEADER_SIZE));
        writer.u16_at(0, VIEW_HEADER_SIZE);
        writer.u8_at(2, self.loops.len() as u8);
        writer.u8_at(5, self.size_flag);
        writer.u8_at(12, LOOP_HEADER_SIZE as u8);
        writer.u8_at(13, CEL_HEADER_SIZE as u8);
        writer.u16_at(14, self.resolution.0);
        writer.u16_at(16, self.resolution.1);

        let loop_headers = writer.reserve(LOOP_HEADER_SIZE * self.loops.len());
        let mut cel_headers = Vec::new();
        for (i, def) in self.loops.iter().enumerate() {
            let header = loop_headers + i * LOOP_HEADER_SIZE;
            match def {
                LoopDef::Mirror(of) => {
                    writer.u8_at(header, *of as u8);
                    writer.u8_at(header + 1, 1);
                }
                LoopDef::Cels(cels) => {
                    writer.u8_at(header, 0xFF);
                    writer.u8_at(header + 2, cels.len() as u8);
                    let first = writer.reserve(CEL_HEADER_SIZE * cels.len());
                    writer.u32_at(header + 12, offset(first));
                    cel_headers.extend(
                        cels.iter()
                            .enumerate()
                            .map(|(n, cel)| (first + n * CEL_HEADER_SIZE, cel)),
                    );
                }
            }
        }

        for (header, cel) in cel_headers {
            writer.cel(header, cel);
        }

        if let Some(palette) = &self.palette {
            let at = writer.append(palette);
            writer.u32_at(8, offset(at));
        }

        writer.bytes
    }
}

/// Synthesises a pic resource.
#[derive(Debug, Clone)]
pub struct PicBuilder {
    cels: Vec<CelDef>,
    size_flags: (u16, u16),
    palette: Option<Vec<u8>>,
    endian: SciEndian,
}

impl Default for PicBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PicBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cels: Vec::new(),
            size_flags: (0, 0),
            palette: None,
            endian: SciEndian::Little,
        }
    }

    #[must_use]
    pub fn add_cel(mut self, cel: CelDef) -> Self {
        self.cels.push(cel);
        self
    }

    /// The two size fields: a 0/1/2 resolution code and 0, or an explicit x and y
    /// resolution.
    #[must_use]
    pub const fn size_flags(mut self, first: u16, second: u16) -> Self {
        self.size_flags = (first, second);
        self
    }

    #[must_use]
    pub fn palette(mut self, palette: Vec<u8>) -> Self {
        self.palette = Some(palette);
        self
    }

    #[must_use]
    pub const fn endian(mut self, endian: SciEndian) -> Self {
        self.endian = endian;
        self
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(&self) -> Vec<u8> {
        let mut writer = Writer::new(self.endian);
        writer.reserve(usize::from(PIC_HEADER_SIZE));
        writer.u16_at(0, PIC_HEADER_SIZE);
        writer.u8_at(2, self.cels.len() as u8);
        writer.u16_at(4, CEL_HEADER_SIZE as u16);
        writer.u16_at(10, self.size_flags.0);
        writer.u16_at(12, self.size_flags.1);

        let first = writer.reserve(CEL_HEADER_SIZE * self.cels.len());
        for (n, cel) in self.cels.iter().enumerate() {
            writer.cel(first + n * CEL_HEADER_SIZE, cel);
        }

        if let Some(palette) = &self.palette {
            let at = writer.append(palette);
            writer.u32_at(6, offset(at));
        }

        writer.bytes
    }
}
