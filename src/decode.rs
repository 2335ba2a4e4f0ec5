//! Dual-view image decoding.
//!
//! Palette indices and transparency chunks are lost once a generic decoder
//! expands an image to RGB(A), so PNG and GIF are additionally read with their
//! format crates to recover the native view:
//! - the native color mode (indexed, gray, RGB, ...),
//! - the palette index of every pixel for indexed images,
//! - format-level transparency metadata (`tRNS`, GIF graphic control).
//!
//! Every other format derives its native view from the generic decode.

use std::io::Cursor;

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use crate::error::DecodeError;

/// Native color mode of an encoded image, before any conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Pixels are indices into a color palette.
    Indexed,
    /// Single luminance channel.
    Gray,
    /// Luminance plus alpha.
    GrayAlpha,
    /// Red, green, blue without alpha.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
}

impl ColorMode {
    fn from_color_type(color: ColorType) -> Self {
        match color {
            ColorType::L8 | ColorType::L16 => Self::Gray,
            ColorType::La8 | ColorType::La16 => Self::GrayAlpha,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => Self::Rgba,
            _ => Self::Rgb,
        }
    }

    fn from_png(color: png::ColorType) -> Self {
        match color {
            png::ColorType::Indexed => Self::Indexed,
            png::ColorType::Grayscale => Self::Gray,
            png::ColorType::GrayscaleAlpha => Self::GrayAlpha,
            png::ColorType::Rgb => Self::Rgb,
            png::ColorType::Rgba => Self::Rgba,
        }
    }
}

/// Format-level transparency metadata, independent of per-pixel alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransparencyMarker {
    /// Per-palette-entry alpha table that is not a single fully transparent entry.
    PaletteAlpha(Vec<u8>),
    /// A gray or RGB sample value declared fully transparent.
    ColorKey(Vec<u16>),
}

/// A palette index used by an indexed image and the number of pixels using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorCount {
    /// Palette index.
    pub index: u8,
    /// Number of pixels carrying that index.
    pub count: usize,
}

/// Native-side information recovered from the encoded stream.
struct NativeView {
    mode: ColorMode,
    indices: Option<Vec<u8>>,
    transparent_index: Option<u8>,
    transparency: Option<TransparencyMarker>,
}

impl NativeView {
    fn from_raster(raster: &DynamicImage) -> Self {
        Self {
            mode: ColorMode::from_color_type(raster.color()),
            indices: None,
            transparent_index: None,
            transparency: None,
        }
    }
}

/// A decoded image carrying both its native view and a generic raster.
///
/// The raster backs [`DecodedImage::to_rgba`] and [`DecodedImage::extrema`];
/// the native view backs [`DecodedImage::mode`], [`DecodedImage::colors`] and
/// the transparency metadata accessors.
pub struct DecodedImage {
    format: ImageFormat,
    native: NativeView,
    raster: DynamicImage,
}

impl DecodedImage {
    /// Decode an encoded image buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Empty`] for a zero-length buffer, and a
    /// format-specific variant for unknown, malformed, or truncated data.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let format = image::guess_format(bytes)?;
        let raster = image::load_from_memory_with_format(bytes, format)?;
        let native = match format {
            ImageFormat::Png => read_png(bytes)?,
            ImageFormat::Gif => read_gif(bytes)?,
            _ => NativeView::from_raster(&raster),
        };

        let (width, height) = raster.dimensions();
        log::trace!("decoded {format:?} {width}x{height} as {:?}", native.mode);

        Ok(Self {
            format,
            native,
            raster,
        })
    }

    /// Container format sniffed from the buffer's magic bytes.
    #[must_use]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Color mode as stored in the file, not after RGBA conversion.
    #[must_use]
    pub fn mode(&self) -> ColorMode {
        self.native.mode
    }

    /// Palette index designated fully transparent, for indexed images.
    #[must_use]
    pub fn transparent_index(&self) -> Option<u8> {
        self.native.transparent_index
    }

    /// Format-level transparency metadata, if the file declares any.
    #[must_use]
    pub fn transparency(&self) -> Option<&TransparencyMarker> {
        self.native.transparency.as_ref()
    }

    /// Distinct palette indices used by the image, ascending, with pixel counts.
    ///
    /// Returns `None` for images that are not indexed.
    #[must_use]
    pub fn colors(&self) -> Option<Vec<ColorCount>> {
        let indices = self.native.indices.as_ref()?;
        let mut counts = [0usize; 256];
        for &index in indices {
            counts[usize::from(index)] += 1;
        }

        Some(
            counts
                .iter()
                .enumerate()
                .filter(|&(_, &count)| count > 0)
                .filter_map(|(index, &count)| {
                    u8::try_from(index).ok().map(|index| ColorCount { index, count })
                })
                .collect(),
        )
    }

    /// RGBA8 conversion of the raster.
    #[must_use]
    pub fn to_rgba(&self) -> RgbaImage {
        self.raster.to_rgba8()
    }

    /// Per-channel `(min, max)` over the RGBA view, in R, G, B, A order.
    ///
    /// An image without pixels reports `(255, 0)` for every channel.
    #[must_use]
    pub fn extrema(&self) -> [(u8, u8); 4] {
        let mut extrema = [(u8::MAX, u8::MIN); 4];
        for pixel in self.to_rgba().pixels() {
            for (channel, &value) in extrema.iter_mut().zip(pixel.0.iter()) {
                channel.0 = channel.0.min(value);
                channel.1 = channel.1.max(value);
            }
        }
        extrema
    }
}

fn read_png(bytes: &[u8]) -> Result<NativeView, DecodeError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::IDENTITY);
    let mut reader = decoder.read_info()?;

    let info = reader.info();
    let mode = ColorMode::from_png(info.color_type);
    let width = info.width as usize;
    let bit_depth = info.bit_depth as u8;
    let trns = info.trns.as_ref().map(|t| t.to_vec());

    if mode != ColorMode::Indexed {
        return Ok(NativeView {
            mode,
            indices: None,
            transparent_index: None,
            transparency: trns.map(|t| TransparencyMarker::ColorKey(color_key(&t))),
        });
    }

    let size = reader
        .output_buffer_size()
        .ok_or(png::DecodingError::LimitsExceeded)?;
    let mut buf = vec![0; size];
    let frame = reader.next_frame(&mut buf)?;
    let indices = unpack_indices(
        &buf[..frame.buffer_size()],
        frame.line_size,
        width,
        bit_depth,
    );

    let (transparent_index, transparency) = match trns {
        Some(alpha) => palette_transparency(&alpha),
        None => (None, None),
    };

    Ok(NativeView {
        mode,
        indices: Some(indices),
        transparent_index,
        transparency,
    })
}

/// Split a `tRNS` table for a palette into a single transparent index or an alpha table.
///
/// Exactly one fully transparent entry with every other entry fully opaque is
/// a plain transparent index. A table of only opaque entries declares nothing,
/// even though the chunk is present (see DESIGN.md, decision 3).
fn palette_transparency(alpha: &[u8]) -> (Option<u8>, Option<TransparencyMarker>) {
    if alpha.iter().all(|&a| a == u8::MAX) {
        return (None, None);
    }

    let binary = alpha.iter().all(|&a| a == 0 || a == u8::MAX);
    let zeros = alpha.iter().filter(|&&a| a == 0).count();
    if binary && zeros == 1 {
        let index = alpha.iter().position(|&a| a == 0).and_then(|i| u8::try_from(i).ok());
        return (index, None);
    }

    (None, Some(TransparencyMarker::PaletteAlpha(alpha.to_vec())))
}

/// Decode big-endian 16-bit samples of a gray or RGB `tRNS` chunk.
fn color_key(trns: &[u8]) -> Vec<u16> {
    trns.chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// Expand packed 1/2/4/8-bit palette rows into one index per pixel.
fn unpack_indices(buf: &[u8], line_size: usize, width: usize, bit_depth: u8) -> Vec<u8> {
    if line_size == 0 {
        return Vec::new();
    }

    let rows = buf.len() / line_size;
    let mut indices = Vec::with_capacity(width * rows);

    if bit_depth == 8 {
        for row in buf.chunks_exact(line_size) {
            indices.extend_from_slice(&row[..width]);
        }
        return indices;
    }

    let depth = usize::from(bit_depth);
    let per_byte = 8 / depth;
    let mask = u8::MAX >> (8 - depth);
    for row in buf.chunks_exact(line_size) {
        for x in 0..width {
            let shift = 8 - depth * (x % per_byte + 1);
            indices.push((row[x / per_byte] >> shift) & mask);
        }
    }
    indices
}

fn read_gif(bytes: &[u8]) -> Result<NativeView, DecodeError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(Cursor::new(bytes))?;

    let screen_w = usize::from(decoder.width());
    let screen_h = usize::from(decoder.height());
    let background = decoder
        .bg_color()
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(0);

    let frame = decoder.read_next_frame()?.ok_or(DecodeError::NoFrames)?;
    let (left, top) = (usize::from(frame.left), usize::from(frame.top));
    let frame_w = usize::from(frame.width);

    // Area outside the first frame shows the background entry.
    let mut indices = vec![background; screen_w * screen_h];
    if frame_w > 0 {
        for (row, line) in frame.buffer.chunks(frame_w).enumerate() {
            let y = top + row;
            if y >= screen_h {
                break;
            }
            for (col, &index) in line.iter().enumerate() {
                let x = left + col;
                if x < screen_w {
                    indices[y * screen_w + x] = index;
                }
            }
        }
    }

    Ok(NativeView {
        mode: ColorMode::Indexed,
        indices: Some(indices),
        transparent_index: frame.transparent,
        transparency: None,
    })
}
