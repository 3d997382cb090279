//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Neither mode ever upscales: a thumbnail request larger than the source
//! yields an image no bigger than the source.

/// Dimensions for a non-cropping resize: scale to fit inside `target`.
///
/// Keeps the source aspect ratio. Sources already inside the box keep their
/// size. Each side is at least 1px.
///
/// # Examples
/// ```
/// # use post_thumb::imaging::calculate_fit_dimensions;
/// // 800x600 into 400x400 → width-bound → 400x300
/// assert_eq!(calculate_fit_dimensions((800, 600), (400, 400)), (400, 300));
/// ```
pub fn calculate_fit_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if src_w <= tgt_w && src_h <= tgt_h {
        return source;
    }

    let ratio = (tgt_w as f64 / src_w as f64).min(tgt_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).round() as u32).max(1);
    let h = ((src_h as f64 * ratio).round() as u32).max(1);
    (w, h)
}

/// Final dimensions for a cropping resize.
///
/// The requested box, clamped to the source on each axis. The backend
/// fills this box and center-crops the overflow.
pub fn calculate_crop_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    (target.0.min(source.0), target.1.min(source.1))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = (h as f64 * src_aspect).round() as u32;
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = (w as f64 / src_aspect).round() as u32;
        (w, h)
    }
}
