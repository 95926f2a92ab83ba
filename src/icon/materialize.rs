//! Icon image materialization
//!
//! Turns the raw payload of an `RT_ICON` resource into an RGBA bitmap at the
//! payload's own resolution. A payload is either a complete PNG stream or a
//! headerless DIB: a `BITMAPINFOHEADER` whose height counts both the colour
//! (XOR) rows and the 1-bpp transparency (AND) rows, followed by the pixels.

use crate::error::{ExtractionError, StringError};
use crate::icon::module::MappedModule;
use image::{ImageFormat, RgbaImage};
use scroll::{LE, Pread};
use tracing::debug;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const ICO_HEADER_SIZE: usize = 6;
const ICO_ENTRY_SIZE: usize = 16;
/// Payload starts right after the header and the single directory entry
const ICO_IMAGE_OFFSET: u32 = 22;
const BITMAPCOREHEADER_SIZE: u32 = 12;
/// `BI_BITFIELDS`: three colour masks follow the header
const BI_BITFIELDS: u32 = 3;

/// Load resource `id` from `module` and decode it
pub fn materialize(module: &MappedModule, id: u16) -> Result<RgbaImage, ExtractionError> {
    let bits = module.icon_image(id)?;
    debug!(
        "Materializing icon #{} from {:?} ({} bytes)",
        id,
        module.path(),
        bits.len()
    );
    icon_from_resource_bits(bits)
}

/// Decode a raw `RT_ICON` payload without resampling
///
/// A 32-bpp bitmap whose alpha bytes are all zero predates per-pixel alpha;
/// its transparency comes from the AND mask instead, as the system loader
/// does it.
pub fn icon_from_resource_bits(bits: &[u8]) -> Result<RgbaImage, ExtractionError> {
    if bits.starts_with(PNG_SIGNATURE) {
        return decode(bits, ImageFormat::Png);
    }

    let info = read_dib_info(bits).map_err(|e| ExtractionError::IconConstruction(Box::new(e)))?;
    let container = wrap_dib_as_ico(bits, &info)?;
    let mut image = decode(&container, ImageFormat::Ico)?;
    if info.bit_count == 32 && image.pixels().all(|pixel| pixel.0[3] == 0) {
        debug!("32-bpp icon has an empty alpha channel, using its AND mask");
        apply_and_mask(&mut image, bits, &info);
    }
    Ok(image)
}

fn decode(bytes: &[u8], format: ImageFormat) -> Result<RgbaImage, ExtractionError> {
    image::load_from_memory_with_format(bytes, format)
        .map(image::DynamicImage::into_rgba8)
        .map_err(|e| ExtractionError::IconConstruction(Box::new(e)))
}

/// Header facts of a DIB payload needed to describe it in an ICO directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DibInfo {
    header_size: u32,
    width: u32,
    height: u32,
    bit_count: u16,
    compression: u32,
    top_down: bool,
}

fn read_dib_info(bits: &[u8]) -> Result<DibInfo, scroll::Error> {
    let header_size: u32 = bits.pread_with(0, LE)?;
    if header_size == BITMAPCOREHEADER_SIZE {
        let width: u16 = bits.pread_with(4, LE)?;
        let height: u16 = bits.pread_with(6, LE)?;
        let bit_count: u16 = bits.pread_with(10, LE)?;
        return Ok(DibInfo {
            header_size,
            width: u32::from(width),
            height: u32::from(height) / 2,
            bit_count,
            compression: 0,
            top_down: false,
        });
    }

    let width: i32 = bits.pread_with(4, LE)?;
    let height: i32 = bits.pread_with(8, LE)?;
    let bit_count: u16 = bits.pread_with(14, LE)?;
    let compression: u32 = bits.pread_with(16, LE)?;
    Ok(DibInfo {
        header_size,
        width: width.unsigned_abs(),
        height: height.unsigned_abs() / 2,
        bit_count,
        compression,
        top_down: height < 0,
    })
}

/// Rebuild alpha from the 1-bpp AND mask: clear bits are opaque, set bits
/// transparent. A missing or short mask leaves the pixels opaque.
fn apply_and_mask(image: &mut RgbaImage, bits: &[u8], info: &DibInfo) {
    let (width, height) = image.dimensions();
    let stride = width.div_ceil(32) as usize * 4;
    let colour_masks = if info.compression == BI_BITFIELDS { 12 } else { 0 };
    let mask_start = (info.header_size as usize + colour_masks)
        .saturating_add((width as usize * 4).saturating_mul(height as usize));
    let mask = bits.get(mask_start..).unwrap_or_default();

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        // DIB rows run bottom-up unless the height is negative
        let row = (if info.top_down { y } else { height - 1 - y }) as usize;
        let transparent = mask
            .get(row * stride + x as usize / 8)
            .is_some_and(|byte| byte & (0x80 >> (x % 8)) != 0);
        pixel.0[3] = if transparent { 0 } else { u8::MAX };
    }
}

/// Put a DIB payload behind a one-entry ICO header so the ICO codec can decode it
fn wrap_dib_as_ico(bits: &[u8], info: &DibInfo) -> Result<Vec<u8>, ExtractionError> {
    if info.width == 0 || info.height == 0 {
        return Err(ExtractionError::IconConstruction(StringError::new(format!(
            "icon bitmap has empty dimensions {}x{}",
            info.width, info.height
        ))));
    }
    let length = u32::try_from(bits.len())
        .map_err(|e| ExtractionError::IconConstruction(Box::new(e)))?;

    let mut container = Vec::with_capacity(ICO_HEADER_SIZE + ICO_ENTRY_SIZE + bits.len());
    container.extend_from_slice(&[0, 0, 1, 0, 1, 0]);
    container.push(directory_edge(info.width));
    container.push(directory_edge(info.height));
    container.extend_from_slice(&[0, 0]);
    container.extend_from_slice(&1u16.to_le_bytes());
    container.extend_from_slice(&info.bit_count.to_le_bytes());
    container.extend_from_slice(&length.to_le_bytes());
    container.extend_from_slice(&ICO_IMAGE_OFFSET.to_le_bytes());
    container.extend_from_slice(bits);
    Ok(container)
}

/// ICO directories store 256 (and anything that does not fit) as 0
fn directory_edge(edge: u32) -> u8 {
    u8::try_from(edge).unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use super::test_support::{dib_payload, png_payload};
    use super::*;

    #[test]
    fn test_dib_keeps_native_dimensions() {
        let image = icon_from_resource_bits(&dib_payload(48)).unwrap();
        assert_eq!(image.dimensions(), (48, 48));
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_png_keeps_native_dimensions() {
        let image = icon_from_resource_bits(&png_payload(256, 256)).unwrap();
        assert_eq!(image.dimensions(), (256, 256));
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_png_larger_than_directory_limit_is_not_rescaled() {
        let image = icon_from_resource_bits(&png_payload(512, 512)).unwrap();
        assert_eq!(image.dimensions(), (512, 512));
    }

    #[test]
    fn test_garbage_payload_is_construction_error() {
        let result = icon_from_resource_bits(&[1, 2, 3]);
        assert!(matches!(result, Err(ExtractionError::IconConstruction(_))));
    }

    #[test]
    fn test_zero_sized_dib_is_construction_error() {
        let mut payload = dib_payload(16);
        payload[4..8].copy_from_slice(&0i32.to_le_bytes());
        let result = icon_from_resource_bits(&payload);
        assert!(matches!(result, Err(ExtractionError::IconConstruction(_))));
    }

    #[test]
    fn test_dib_info_halves_height() {
        let info = read_dib_info(&dib_payload(32)).unwrap();
        assert_eq!(
            info,
            DibInfo {
                header_size: 40,
                width: 32,
                height: 32,
                bit_count: 32,
                compression: 0,
                top_down: false,
            }
        );
    }

    /// `dib_payload` with every alpha byte set to `alpha`
    fn with_alpha(size: u32, alpha: u8) -> Vec<u8> {
        let mut payload = dib_payload(size);
        for pixel in 0..(size * size) as usize {
            payload[40 + pixel * 4 + 3] = alpha;
        }
        payload
    }

    #[test]
    fn test_zero_alpha_dib_takes_transparency_from_and_mask() {
        let mut payload = with_alpha(8, 0);
        // First mask row is the bottom image row; hide its left half
        payload[40 + 8 * 8 * 4] = 0xF0;

        let image = icon_from_resource_bits(&payload).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(7, 7).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(0, 7).0[3], 0);
        assert_eq!(image.get_pixel(3, 7).0[3], 0);
        assert_eq!(image.get_pixel(4, 7).0[3], 255);
    }

    #[test]
    fn test_zero_alpha_dib_with_clear_mask_is_opaque() {
        let image = icon_from_resource_bits(&with_alpha(32, 0)).unwrap();
        assert!(image.pixels().all(|pixel| pixel.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_dib_with_real_alpha_is_left_alone() {
        let image = icon_from_resource_bits(&with_alpha(16, 128)).unwrap();
        assert!(image.pixels().all(|pixel| pixel.0[3] == 128));
    }

    #[test]
    fn test_and_mask_without_mask_bytes_leaves_pixels_opaque() {
        let info = read_dib_info(&dib_payload(4)).unwrap();
        let mut image = RgbaImage::from_pixel(4, 4, image::Rgba([1, 2, 3, 0]));
        apply_and_mask(&mut image, &dib_payload(4)[..40], &info);
        assert!(image.pixels().all(|pixel| pixel.0 == [1, 2, 3, 255]));
    }

    #[test]
    fn test_directory_edge_encodes_256_as_zero() {
        assert_eq!(directory_edge(256), 0);
        assert_eq!(directory_edge(48), 48);
    }
}
