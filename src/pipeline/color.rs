//! Fixed-point BT.601 YUV -> packed ARGB conversion

/// 2^18 - 1: the largest channel value before descaling by 2^10
const MAX_CHANNEL_VALUE: i32 = 262_143;

const OPAQUE: u32 = 0xFF00_0000;

/// Convert one studio-range Y/U/V sample triple to a packed `0xAARRGGBB`
/// pixel with alpha fixed at 0xFF.
///
/// Integer arithmetic scaled by 1024; the results match the floating-point
/// form `R = 1.164y + 1.596v`, `G = 1.164y - 0.813v - 0.391u`,
/// `B = 1.164y + 2.018u` to within rounding, bit-for-bit reproducible.
#[inline]
pub fn yuv_to_argb(y: u8, u: u8, v: u8) -> u32 {
    let y = (i32::from(y) - 16).max(0);
    let u = i32::from(u) - 128;
    let v = i32::from(v) - 128;

    let r = 1192 * y + 1634 * v;
    let g = 1192 * y - 833 * v - 400 * u;
    let b = 1192 * y + 2066 * u;

    OPAQUE | (descale(r) << 16) | (descale(g) << 8) | descale(b)
}

#[inline]
fn descale(channel: i32) -> u32 {
    ((channel.clamp(0, MAX_CHANNEL_VALUE) >> 10) & 0xFF) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(pixel: u32) -> (u32, u32, u32, u32) {
        (
            pixel >> 24,
            (pixel >> 16) & 0xFF,
            (pixel >> 8) & 0xFF,
            pixel & 0xFF,
        )
    }

    #[test]
    fn studio_black() {
        assert_eq!(yuv_to_argb(16, 128, 128), 0xFF00_0000);
    }

    #[test]
    fn below_black_clamps_luma() {
        assert_eq!(yuv_to_argb(0, 128, 128), 0xFF00_0000);
    }

    #[test]
    fn studio_white() {
        // 1192 * 219 = 261048, >> 10 = 254
        assert_eq!(yuv_to_argb(235, 128, 128), 0xFFFE_FEFE);
        let (_, r, g, b) = channels(yuv_to_argb(255, 128, 128));
        assert_eq!((r, g, b), (255, 255, 255));
    }

    #[test]
    fn saturated_red() {
        // BT.601 studio-range red
        let (_, r, g, b) = channels(yuv_to_argb(81, 90, 240));
        assert!(r >= 250, "r = {r}");
        assert!(g < 8, "g = {g}");
        assert!(b < 8, "b = {b}");
    }

    #[test]
    fn negative_channels_clamp_to_zero() {
        // Strong negative V with zero luma pushes R below zero.
        let (_, r, _, _) = channels(yuv_to_argb(16, 128, 0));
        assert_eq!(r, 0);
    }

    #[test]
    fn alpha_always_opaque() {
        for y in (0..=255u8).step_by(5) {
            for u in (0..=255u8).step_by(17) {
                for v in (0..=255u8).step_by(17) {
                    assert_eq!(yuv_to_argb(y, u, v) >> 24, 0xFF, "yuv {y},{u},{v}");
                }
            }
        }
    }
}
