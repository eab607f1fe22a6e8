//! Layer source decoding.
//!
//! Two containers are understood: the raw imaging format produced by the
//! bitstream tools (fixed 32 byte header followed by samples) and uncompressed
//! Windows bitmaps. Both decode into a [`Raster`] of `i32` samples, where `0`
//! is background and anything else is foreground.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind as IoErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{alloc_filled, Error, Result};

pub const RAW_HEADER_SIZE: usize = 32;
pub const RAW_SIGNATURE: i16 = 0xAAAAu16 as i16;
pub const RAW_HEADER_VERSION: i16 = 1;

const BMP_FILE_HEADER_SIZE: usize = 14;
const BMP_INFO_HEADER_SIZE: usize = 40;
const BMP_SIGNATURE: u16 = 0x4d42;

/// Byte order of the samples following a raw header. The header fields
/// themselves are always little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Flag value `0`.
    Big,
    /// Flag value `-1`.
    Little,
}

impl Endian {
    fn flag(self) -> i16 {
        match self {
            Endian::Big => 0,
            Endian::Little => -1,
        }
    }
}

/// Width in bytes of one raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelSize {
    U8 = 1,
    U16 = 2,
    I32 = 4,
}

impl PixelSize {
    pub fn bytes(self) -> usize {
        self as usize
    }

    fn from_field(value: i16) -> Option<Self> {
        match value {
            1 => Some(PixelSize::U8),
            2 => Some(PixelSize::U16),
            4 => Some(PixelSize::I32),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader {
    pub endian: Endian,
    pub width: u32,
    pub height: u32,
    pub pixel_size: PixelSize,
    pub frames: u16,
    pub version: i16,
}

impl RawHeader {
    pub fn new(width: u32, height: u32, frames: u16, pixel_size: PixelSize, endian: Endian) -> Self {
        Self {
            endian,
            width,
            height,
            pixel_size,
            frames,
            version: RAW_HEADER_VERSION,
        }
    }

    fn parse(bytes: &[u8; RAW_HEADER_SIZE], path: &Path) -> Result<Self> {
        let i16_at = |at: usize| i16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let i32_at = |at: usize| {
            i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        let endian = match i16_at(0) {
            0 => Endian::Big,
            -1 => Endian::Little,
            other => return Err(Error::file_type(path, format!("bad endian flag {}", other))),
        };
        if i16_at(2) != RAW_SIGNATURE {
            return Err(Error::file_type(path, "missing raw image signature"));
        }
        if i16_at(4) as usize != RAW_HEADER_SIZE {
            return Err(Error::file_type(path, format!("bad header size {}", i16_at(4))));
        }
        let pixel_size = PixelSize::from_field(i16_at(14))
            .ok_or_else(|| Error::file_type(path, format!("bad pixel size {}", i16_at(14))))?;

        let (width, height, frames) = (i32_at(6), i32_at(10), i16_at(16));
        if width <= 0 || height <= 0 || frames <= 0 {
            return Err(Error::parameter(format!(
                "{}: image is {}x{} with {} frames",
                path.display(),
                width,
                height,
                frames
            )));
        }

        Ok(Self {
            endian,
            width: width as u32,
            height: height as u32,
            pixel_size,
            frames: frames as u16,
            version: i16_at(18),
        })
    }

    fn to_bytes(self) -> [u8; RAW_HEADER_SIZE] {
        let mut out = [0u8; RAW_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.endian.flag().to_le_bytes());
        out[2..4].copy_from_slice(&RAW_SIGNATURE.to_le_bytes());
        out[4..6].copy_from_slice(&(RAW_HEADER_SIZE as i16).to_le_bytes());
        out[6..10].copy_from_slice(&(self.width as i32).to_le_bytes());
        out[10..14].copy_from_slice(&(self.height as i32).to_le_bytes());
        out[14..16].copy_from_slice(&(self.pixel_size as i16).to_le_bytes());
        out[16..18].copy_from_slice(&(self.frames as i16).to_le_bytes());
        out[18..20].copy_from_slice(&self.version.to_le_bytes());
        out
    }

    fn samples(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.frames as usize)
    }
}

/// A single-frame integer image in top-down raster order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<i32>,
}

impl Raster {
    pub fn new(width: u32, height: u32, pixels: Vec<i32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::parameter(format!("raster is {}x{}", width, height)));
        }
        if pixels.len() != width as usize * height as usize {
            return Err(Error::parameter(format!(
                "raster {}x{} given {} pixels",
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[i32] {
        &self.pixels
    }

    pub fn row(&self, y: u32) -> &[i32] {
        let w = self.width as usize;
        &self.pixels[y as usize * w..(y as usize + 1) * w]
    }

    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

/// Contents of a raw image file: header plus every frame's samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub header: RawHeader,
    pixels: Vec<i32>,
}

impl RawImage {
    pub fn new(header: RawHeader, pixels: Vec<i32>) -> Result<Self> {
        if header.samples() != Some(pixels.len()) {
            return Err(Error::parameter(format!(
                "{}x{}x{} raw image given {} samples",
                header.width,
                header.height,
                header.frames,
                pixels.len()
            )));
        }
        Ok(Self { header, pixels })
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn frames(&self) -> u16 {
        self.header.frames
    }

    pub fn pixel_size(&self) -> PixelSize {
        self.header.pixel_size
    }

    pub fn frame(&self, index: u16) -> Option<&[i32]> {
        if index >= self.header.frames {
            return None;
        }
        let len = self.header.width as usize * self.header.height as usize;
        let start = index as usize * len;
        Some(&self.pixels[start..start + len])
    }

    /// Keep only the first frame.
    pub fn into_raster(mut self) -> Raster {
        let len = self.header.width as usize * self.header.height as usize;
        self.pixels.truncate(len);
        Raster {
            width: self.header.width,
            height: self.header.height,
            pixels: self.pixels,
        }
    }
}

/// Which decoder produced a layer image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Raw {
        frames: u16,
        pixel_size: PixelSize,
        endian: Endian,
    },
    Bitmap {
        bits_per_pixel: u16,
    },
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })
}

fn read_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    }
}

pub fn load_raw_image(path: &Path) -> Result<RawImage> {
    let mut reader = BufReader::new(open(path)?);

    let mut header_bytes = [0u8; RAW_HEADER_SIZE];
    reader.read_exact(&mut header_bytes).map_err(read_error(path))?;
    let header = RawHeader::parse(&header_bytes, path)?;

    let samples = header.samples().ok_or(Error::Memory(usize::MAX))?;
    let byte_len = samples
        .checked_mul(header.pixel_size.bytes())
        .ok_or(Error::Memory(usize::MAX))?;

    let mut raw = alloc_filled(byte_len, 0u8)?;
    reader.read_exact(&mut raw).map_err(read_error(path))?;

    let mut pixels = Vec::new();
    pixels.try_reserve_exact(samples).map_err(|_| Error::Memory(samples))?;
    match (header.pixel_size, header.endian) {
        (PixelSize::U8, _) => pixels.extend(raw.iter().map(|&b| b as i32)),
        (PixelSize::U16, Endian::Little) => pixels.extend(
            raw.chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]) as i32),
        ),
        (PixelSize::U16, Endian::Big) => pixels.extend(
            raw.chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]) as i32),
        ),
        (PixelSize::I32, Endian::Little) => pixels.extend(
            raw.chunks_exact(4)
                .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]])),
        ),
        (PixelSize::I32, Endian::Big) => pixels.extend(
            raw.chunks_exact(4)
                .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]])),
        ),
    }

    tracing::debug!(
        "Loaded raw image {} ({}x{}, {} frame(s), {} byte samples)",
        path.display(),
        header.width,
        header.height,
        header.frames,
        header.pixel_size.bytes()
    );

    Ok(RawImage { header, pixels })
}

/// Write a raw image; samples are truncated to the header's pixel size.
pub fn save_raw_image(path: &Path, image: &RawImage) -> Result<()> {
    let file = File::create(path).map_err(|source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    let write_err = |source| Error::FileOpen {
        path: path.to_path_buf(),
        source,
    };

    out.write_all(&image.header.to_bytes()).map_err(write_err)?;
    for &sample in &image.pixels {
        let result = match (image.header.pixel_size, image.header.endian) {
            (PixelSize::U8, _) => out.write_all(&[sample as u8]),
            (PixelSize::U16, Endian::Little) => out.write_all(&(sample as u16).to_le_bytes()),
            (PixelSize::U16, Endian::Big) => out.write_all(&(sample as u16).to_be_bytes()),
            (PixelSize::I32, Endian::Little) => out.write_all(&sample.to_le_bytes()),
            (PixelSize::I32, Endian::Big) => out.write_all(&sample.to_be_bytes()),
        };
        result.map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(())
}

/// Decode a 1, 8 or 24 bit uncompressed bitmap.
pub fn load_bitmap_image(path: &Path) -> Result<Raster> {
    decode_bitmap(path).map(|(raster, _)| raster)
}

fn decode_bitmap(path: &Path) -> Result<(Raster, u16)> {
    let mut reader = BufReader::new(open(path)?);

    let mut headers = [0u8; BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE];
    reader
        .read_exact(&mut headers)
        .map_err(|e| match e.kind() {
            IoErrorKind::UnexpectedEof => Error::file_type(path, "too short for a bitmap header"),
            _ => read_error(path)(e),
        })?;

    let u16_at = |at: usize| u16::from_le_bytes([headers[at], headers[at + 1]]);
    let u32_at = |at: usize| {
        u32::from_le_bytes([headers[at], headers[at + 1], headers[at + 2], headers[at + 3]])
    };
    let i32_at = |at: usize| u32_at(at) as i32;

    if u16_at(0) != BMP_SIGNATURE || u16_at(6) != 0 || u16_at(8) != 0 {
        return Err(Error::file_type(path, "missing bitmap signature"));
    }
    let data_offset = u32_at(10) as u64;

    let info = BMP_FILE_HEADER_SIZE;
    if (u32_at(info) as usize) < BMP_INFO_HEADER_SIZE {
        return Err(Error::file_type(path, "unsupported bitmap info header"));
    }
    let width = i32_at(info + 4);
    let raw_height = i32_at(info + 8);
    let planes = u16_at(info + 12);
    let bits = u16_at(info + 14);
    let compression = u32_at(info + 16);

    if compression != 0 {
        return Err(Error::file_type(path, "compressed bitmaps are not supported"));
    }
    if planes != 1 || !matches!(bits, 1 | 8 | 24) {
        return Err(Error::file_type(
            path,
            format!("unsupported bit depth {} ({} planes)", bits, planes),
        ));
    }
    if width <= 0 || raw_height == 0 || raw_height == i32::MIN {
        return Err(Error::file_type(
            path,
            format!("bad dimensions {}x{}", width, raw_height),
        ));
    }

    let bottom_up = raw_height > 0;
    let width = width as usize;
    let height = raw_height.unsigned_abs() as usize;
    let stride = ((width * bits as usize + 31) & !31) >> 3;

    reader
        .seek(SeekFrom::Start(data_offset))
        .map_err(read_error(path))?;

    let len = width.checked_mul(height).ok_or(Error::Memory(usize::MAX))?;
    let mut pixels = alloc_filled(len, 0i32)?;
    let mut line = alloc_filled(stride, 0u8)?;

    for stored_row in 0..height {
        reader.read_exact(&mut line).map_err(read_error(path))?;
        let y = if bottom_up {
            height - 1 - stored_row
        } else {
            stored_row
        };
        let dst = &mut pixels[y * width..(y + 1) * width];
        match bits {
            1 => {
                for (x, px) in dst.iter_mut().enumerate() {
                    *px = ((line[x / 8] & (0x80 >> (x % 8))) != 0) as i32;
                }
            }
            8 => {
                for (px, &b) in dst.iter_mut().zip(line.iter()) {
                    *px = b as i32;
                }
            }
            _ => {
                for (px, bgr) in dst.iter_mut().zip(line.chunks_exact(3)) {
                    *px = ((bgr[2] as i32) << 16) | ((bgr[1] as i32) << 8) | bgr[0] as i32;
                }
            }
        }
    }

    tracing::debug!(
        "Loaded {}-bit bitmap {} ({}x{})",
        bits,
        path.display(),
        width,
        height
    );

    let raster = Raster {
        width: width as u32,
        height: height as u32,
        pixels,
    };
    Ok((raster, bits))
}

/// Load a layer source: raw format first, bitmap second. When neither
/// decoder accepts the file the bitmap decoder's error is returned.
pub fn load_layer_image(path: &Path) -> Result<(Raster, SourceFormat)> {
    match load_raw_image(path) {
        Ok(raw) => {
            let format = SourceFormat::Raw {
                frames: raw.frames(),
                pixel_size: raw.pixel_size(),
                endian: raw.header.endian,
            };
            if raw.frames() > 1 {
                tracing::debug!(
                    "{} has {} frames, using the first",
                    path.display(),
                    raw.frames()
                );
            }
            Ok((raw.into_raster(), format))
        }
        Err(raw_err) => {
            tracing::debug!("{} is not a raw image ({}), trying bitmap", path.display(), raw_err);
            let (raster, bits) = decode_bitmap(path)?;
            Ok((raster, SourceFormat::Bitmap { bits_per_pixel: bits }))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Build an uncompressed bitmap in memory. `rows` are top-down; `bits` is
    /// 1, 8 or 24 (24-bit samples are packed `0xRRGGBB`).
    pub(crate) fn bitmap_bytes(bits: u16, width: usize, rows: &[Vec<u32>], top_down: bool) -> Vec<u8> {
        let height = rows.len();
        let stride = ((width * bits as usize + 31) & !31) >> 3;
        let palette_len = match bits {
            1 => 2 * 4,
            8 => 256 * 4,
            _ => 0,
        };
        let offset = BMP_FILE_HEADER_SIZE + BMP_INFO_HEADER_SIZE + palette_len;
        let mut out = Vec::new();
        out.extend_from_slice(&BMP_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&((offset + stride * height) as u32).to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        out.extend_from_slice(&(BMP_INFO_HEADER_SIZE as u32).to_le_bytes());
        out.extend_from_slice(&(width as i32).to_le_bytes());
        let h = if top_down { -(height as i32) } else { height as i32 };
        out.extend_from_slice(&h.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(&[0; 24]);
        out.extend(std::iter::repeat(0u8).take(palette_len));

        let order: Vec<&Vec<u32>> = if top_down {
            rows.iter().collect()
        } else {
            rows.iter().rev().collect()
        };
        for row in order {
            let mut line = vec![0u8; stride];
            for (x, &v) in row.iter().enumerate() {
                match bits {
                    1 => {
                        if v != 0 {
                            line[x / 8] |= 0x80 >> (x % 8);
                        }
                    }
                    8 => line[x] = v as u8,
                    _ => {
                        line[x * 3] = v as u8;
                        line[x * 3 + 1] = (v >> 8) as u8;
                        line[x * 3 + 2] = (v >> 16) as u8;
                    }
                }
            }
            out.extend_from_slice(&line);
        }
        out
    }

    /// Write a single-frame 8-bit raw image.
    pub(crate) fn write_raw(path: &Path, width: u32, height: u32, pixels: Vec<i32>) {
        let header = RawHeader::new(width, height, 1, PixelSize::U8, Endian::Little);
        save_raw_image(path, &RawImage::new(header, pixels).unwrap()).unwrap();
    }

    #[test]
    fn raw_round_trip_all_sample_widths() {
        let dir = tempfile::tempdir().unwrap();
        for (size, endian) in [
            (PixelSize::U8, Endian::Little),
            (PixelSize::U16, Endian::Big),
            (PixelSize::U16, Endian::Little),
            (PixelSize::I32, Endian::Big),
            (PixelSize::I32, Endian::Little),
        ] {
            let path = dir.path().join(format!("img_{:?}_{:?}.raw", size, endian));
            let pixels: Vec<i32> = (0..12).map(|v| v * 17).collect();
            let header = RawHeader::new(3, 2, 2, size, endian);
            save_raw_image(&path, &RawImage::new(header, pixels.clone()).unwrap()).unwrap();

            let loaded = load_raw_image(&path).unwrap();
            assert_eq!(loaded.header, header);
            assert_eq!(loaded.frame(0).unwrap(), &pixels[..6]);
            assert_eq!(loaded.frame(1).unwrap(), &pixels[6..]);
            assert!(loaded.frame(2).is_none());
        }
    }

    #[test]
    fn big_endian_samples_are_swapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("be.raw");
        let header = RawHeader::new(1, 1, 1, PixelSize::U16, Endian::Big);
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&[0x12, 0x34]);
        std::fs::write(&path, bytes).unwrap();

        let raw = load_raw_image(&path).unwrap();
        assert_eq!(raw.into_raster().pixels(), &[0x1234]);
    }

    #[test]
    fn raw_header_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let header = RawHeader::new(2, 2, 1, PixelSize::U8, Endian::Little);

        let path = dir.path().join("sig.raw");
        let mut bytes = header.to_bytes().to_vec();
        bytes[2] = 0;
        bytes.extend_from_slice(&[0; 4]);
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_raw_image(&path).unwrap_err().kind(), ErrorKind::FileType);

        let path = dir.path().join("pixel.raw");
        let mut bytes = header.to_bytes().to_vec();
        bytes[14] = 3;
        bytes.extend_from_slice(&[0; 12]);
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_raw_image(&path).unwrap_err().kind(), ErrorKind::FileType);

        let path = dir.path().join("short.raw");
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_raw_image(&path).unwrap_err().kind(), ErrorKind::FileRead);

        let path = dir.path().join("tiny.raw");
        std::fs::write(&path, [0u8; 5]).unwrap();
        assert_eq!(load_raw_image(&path).unwrap_err().kind(), ErrorKind::FileRead);

        let missing = dir.path().join("missing.raw");
        assert_eq!(load_raw_image(&missing).unwrap_err().kind(), ErrorKind::FileOpen);
    }

    #[test]
    fn decodes_bitmaps_top_down() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![vec![1, 0, 1, 1, 0, 0, 0, 0, 1], vec![0, 1, 0, 0, 0, 0, 0, 1, 0]];
        let expected: Vec<i32> = rows.iter().flatten().map(|&v| v as i32).collect();

        for top_down in [false, true] {
            let path = dir.path().join(format!("mono_{}.bmp", top_down));
            std::fs::write(&path, bitmap_bytes(1, 9, &rows, top_down)).unwrap();
            let raster = load_bitmap_image(&path).unwrap();
            assert_eq!((raster.width(), raster.height()), (9, 2));
            assert_eq!(raster.pixels(), &expected[..]);
        }

        let indexed = vec![vec![0, 7, 255], vec![3, 0, 9]];
        let path = dir.path().join("indexed.bmp");
        std::fs::write(&path, bitmap_bytes(8, 3, &indexed, false)).unwrap();
        let raster = load_bitmap_image(&path).unwrap();
        assert_eq!(raster.row(0), &[0, 7, 255]);
        assert_eq!(raster.row(1), &[3, 0, 9]);

        let rgb = vec![vec![0xff0000, 0x000000], vec![0x00ff00, 0x010203]];
        let path = dir.path().join("rgb.bmp");
        std::fs::write(&path, bitmap_bytes(24, 2, &rgb, false)).unwrap();
        let raster = load_bitmap_image(&path).unwrap();
        assert_eq!(raster.pixels(), &[0xff0000, 0, 0x00ff00, 0x010203]);
    }

    #[test]
    fn bitmap_rejections() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![vec![1, 2]];

        let path = dir.path().join("sig.bmp");
        let mut bytes = bitmap_bytes(8, 2, &rows, false);
        bytes[0] = b'X';
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_bitmap_image(&path).unwrap_err().kind(), ErrorKind::FileType);

        let path = dir.path().join("rle.bmp");
        let mut bytes = bitmap_bytes(8, 2, &rows, false);
        bytes[BMP_FILE_HEADER_SIZE + 16] = 1;
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_bitmap_image(&path).unwrap_err().kind(), ErrorKind::FileType);

        let path = dir.path().join("depth.bmp");
        let mut bytes = bitmap_bytes(8, 2, &rows, false);
        bytes[BMP_FILE_HEADER_SIZE + 14] = 16;
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_bitmap_image(&path).unwrap_err().kind(), ErrorKind::FileType);

        let path = dir.path().join("truncated.bmp");
        let mut bytes = bitmap_bytes(8, 2, &rows, false);
        bytes.truncate(bytes.len() - 2);
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(load_bitmap_image(&path).unwrap_err().kind(), ErrorKind::FileRead);
    }

    #[test]
    fn layer_loader_falls_back_to_bitmap() {
        let dir = tempfile::tempdir().unwrap();

        let raw = dir.path().join("a.raw");
        write_raw(&raw, 2, 1, vec![0, 5]);
        let (raster, format) = load_layer_image(&raw).unwrap();
        assert_eq!(raster.pixels(), &[0, 5]);
        assert!(matches!(format, SourceFormat::Raw { frames: 1, .. }));

        let bmp = dir.path().join("b.bmp");
        std::fs::write(&bmp, bitmap_bytes(1, 2, &[vec![1, 0]], false)).unwrap();
        let (raster, format) = load_layer_image(&bmp).unwrap();
        assert_eq!(raster.pixels(), &[1, 0]);
        assert_eq!(format, SourceFormat::Bitmap { bits_per_pixel: 1 });

        let junk = dir.path().join("c.txt");
        std::fs::write(&junk, b"not an image at all, definitely not a bitmap header").unwrap();
        assert_eq!(load_layer_image(&junk).unwrap_err().kind(), ErrorKind::FileType);
    }
}
