use image::{Rgba, RgbaImage};

pub const SKIN_WIDTH: u32 = 64;
pub const LEGACY_HEIGHT: u32 = 32;
pub const MODERN_HEIGHT: u32 = 64;

/// One rectangle copied from the legacy top half into the modern bottom half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionCopy {
    pub src_x: u32,
    pub src_y: u32,
    pub dst_x: u32,
    pub dst_y: u32,
    pub w: u32,
    pub h: u32,
}

const fn region(src_x: u32, src_y: u32, dst_x: u32, dst_y: u32, w: u32, h: u32) -> RegionCopy {
    RegionCopy {
        src_x,
        src_y,
        dst_x,
        dst_y,
        w,
        h,
    }
}

/// Legacy 64x32 -> modern 64x64 copy table, applied in order.
///
/// Every source lies in rows 0..32 and every destination in rows 32..64, so
/// reads never observe an earlier write. Destinations do overlap (the head
/// band covers part of the sleeve block); the later entry wins.
pub static LEGACY_REGION_COPIES: [RegionCopy; 30] = [
    // Leg caps and sides -> pants overlay.
    region(4, 16, 4, 32, 4, 4),
    region(8, 16, 8, 32, 4, 4),
    region(0, 20, 0, 36, 4, 12),
    region(4, 20, 4, 36, 4, 12),
    region(8, 20, 8, 36, 4, 12),
    region(12, 20, 12, 36, 4, 12),
    // Leg -> left leg.
    region(4, 16, 20, 48, 4, 4),
    region(8, 16, 24, 48, 4, 4),
    region(0, 20, 16, 52, 4, 12),
    region(4, 20, 20, 52, 4, 12),
    region(8, 20, 24, 52, 4, 12),
    region(12, 20, 28, 52, 4, 12),
    // Arm caps and sides -> sleeve overlay.
    region(44, 16, 44, 32, 4, 4),
    region(48, 16, 48, 32, 4, 4),
    region(40, 20, 40, 36, 4, 12),
    region(44, 20, 44, 36, 4, 12),
    region(48, 20, 48, 36, 4, 12),
    region(52, 20, 52, 36, 4, 12),
    // Arm -> left arm.
    region(44, 16, 36, 48, 4, 4),
    region(48, 16, 40, 48, 4, 4),
    region(40, 20, 32, 52, 4, 12),
    region(44, 20, 36, 52, 4, 12),
    region(48, 20, 40, 52, 4, 12),
    region(52, 20, 44, 52, 4, 12),
    // Head band.
    region(40, 0, 32, 32, 8, 8),
    region(48, 0, 40, 32, 8, 8),
    region(32, 8, 32, 40, 8, 8),
    region(40, 8, 40, 40, 8, 8),
    region(48, 8, 48, 40, 8, 8),
    region(56, 8, 56, 40, 8, 8),
];

#[inline(always)]
pub fn is_legacy_layout(img: &RgbaImage) -> bool {
    img.dimensions() == (SKIN_WIDTH, LEGACY_HEIGHT)
}

/// Converts a legacy 64x32 skin into the 64x64 layout.
///
/// Returns `None` when `src` is not 64x32.
pub fn remap_legacy(src: &RgbaImage) -> Option<RgbaImage> {
    if !is_legacy_layout(src) {
        return None;
    }

    let mut out = RgbaImage::from_pixel(SKIN_WIDTH, MODERN_HEIGHT, Rgba([0, 0, 0, 0]));
    for (x, y, px) in src.enumerate_pixels() {
        out.put_pixel(x, y, *px);
    }
    for copy in &LEGACY_REGION_COPIES {
        apply_region(&mut out, src, copy);
    }
    Some(out)
}

#[inline(always)]
fn apply_region(out: &mut RgbaImage, src: &RgbaImage, copy: &RegionCopy) {
    for dy in 0..copy.h {
        for dx in 0..copy.w {
            let px = *src.get_pixel(copy.src_x + dx, copy.src_y + dy);
            out.put_pixel(copy.dst_x + dx, copy.dst_y + dy, px);
        }
    }
}
