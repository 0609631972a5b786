use image::RgbImage;

use super::error::TrackerError;
use super::sample::Position;
use super::types::ColorRange;

/// Centroid of the pixels inside `range`, with the vertical axis flipped so
/// that row `height - 1` maps to `y = 0`.
pub fn locate(frame: &RgbImage, range: &ColorRange, min_area: usize) -> Result<Position, TrackerError> {
    let mut count = 0usize;
    let mut sum_col = 0.0;
    let mut sum_row = 0.0;

    for (col, row, pixel) in frame.enumerate_pixels() {
        if range.contains(pixel.0) {
            count += 1;
            sum_col += col as f64;
            sum_row += row as f64;
        }
    }

    if count == 0 || count < min_area {
        return Err(TrackerError::NotFound);
    }

    let n = count as f64;
    let bottom = frame.height().saturating_sub(1) as f64;
    Ok(Position::new(sum_col / n, bottom - sum_row / n))
}
