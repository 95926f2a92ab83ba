//! Generic application icon
//!
//! Last resort of the fallback chain. Drawn in memory, so it is always
//! available.

use image::{Rgba, RgbaImage};

/// Edge length of the generic application icon
pub const PLACEHOLDER_SIZE: u32 = 32;

const FRAME: Rgba<u8> = Rgba([64, 64, 64, 255]);
const TITLE_BAR: Rgba<u8> = Rgba([0, 102, 204, 255]);
const BODY: Rgba<u8> = Rgba([235, 235, 235, 255]);
const TITLE_BAR_HEIGHT: u32 = 7;

/// A small window glyph: dark frame, blue title bar, light client area
pub fn placeholder_icon() -> RgbaImage {
    let last = PLACEHOLDER_SIZE - 1;
    RgbaImage::from_fn(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, |x, y| {
        if x == 0 || x == last || y == 0 || y == last {
            FRAME
        } else if y < TITLE_BAR_HEIGHT {
            TITLE_BAR
        } else {
            BODY
        }
    })
}
