//! Numbered placeholder pictures for trying out templates.

use std::path::{Path, PathBuf};

use image::error::{ParameterError, ParameterErrorKind};
use image::{ImageError, Rgb, RgbImage};

use crate::error::Error;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BORDER: u32 = 5;

// Seven-segment masks, bit 0 = top (a) through bit 6 = middle (g).
const SEGMENTS: [u8; 10] = [63, 6, 91, 79, 102, 109, 125, 7, 127, 111];

/// Write `dummy_01.jpg` … `dummy_NN.jpg` into `dir`, each `size`×`size`.
pub fn create_dummy_images(dir: &Path, count: usize, size: u32) -> Result<Vec<PathBuf>, Error> {
    if size == 0 {
        return Err(Error::Image(ImageError::Parameter(ParameterError::from_kind(
            ParameterErrorKind::Generic("dummy image size must be at least 1 pixel".into()),
        ))));
    }
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(count);
    for number in 1..=count {
        let path = dir.join(format!("dummy_{:02}.jpg", number));
        render_dummy(number, size).save(&path)?;
        log::info!("Created {}", path.display());
        written.push(path);
    }
    log::info!("Created {} dummy images in {}", count, dir.display());
    Ok(written)
}

/// White square with a red border and `number` in black digits at the centre.
pub fn render_dummy(number: usize, size: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, WHITE);

    let border = BORDER.min(size / 2);
    fill_rect(&mut img, 0, 0, size, border, RED);
    fill_rect(&mut img, 0, size.saturating_sub(border), size, border, RED);
    fill_rect(&mut img, 0, 0, border, size, RED);
    fill_rect(&mut img, size.saturating_sub(border), 0, border, size, RED);

    let digits: Vec<usize> = number
        .to_string()
        .bytes()
        .map(|b| (b - b'0') as usize)
        .collect();
    let height = size * 2 / 5;
    let width = height / 2;
    let stroke = (size / 40).max(2).min(width / 3).max(1);
    let gap = stroke * 2;
    let n = digits.len() as u32;
    let total = n * width + n.saturating_sub(1) * gap;
    let mut x = size.saturating_sub(total) / 2;
    let y = size.saturating_sub(height) / 2;

    for digit in digits {
        draw_digit(&mut img, digit, x, y, width, height, stroke);
        x += width + gap;
    }
    img
}

fn draw_digit(img: &mut RgbImage, digit: usize, x: u32, y: u32, w: u32, h: u32, t: u32) {
    let t = t.min(w).min(h);
    let half = h / 2;
    let segments = [
        (x, y, w, t),                        // a
        (x + w - t, y, t, half),             // b
        (x + w - t, y + half, t, h - half),  // c
        (x, y + h - t, w, t),                // d
        (x, y + half, t, h - half),          // e
        (x, y, t, half),                     // f
        (x, (y + half).saturating_sub(t / 2), w, t), // g
    ];
    let mask = SEGMENTS[digit % 10];
    for (bit, &(sx, sy, sw, sh)) in segments.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            fill_rect(img, sx, sy, sw, sh, BLACK);
        }
    }
}

fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    let x_end = x.saturating_add(w).min(img.width());
    let y_end = y.saturating_add(h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_is_red_and_background_white() {
        let img = render_dummy(1, 200);
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(*img.get_pixel(4, 100), RED);
        assert_eq!(*img.get_pixel(199, 199), RED);
        assert_eq!(*img.get_pixel(10, 10), WHITE);
    }

    #[test]
    fn eight_lights_the_middle_segment() {
        let img = render_dummy(8, 200);
        assert_eq!(*img.get_pixel(100, 100), BLACK);
    }

    #[test]
    fn one_leaves_the_centre_empty() {
        let img = render_dummy(1, 200);
        assert_eq!(*img.get_pixel(100, 100), WHITE);
        // Right-hand vertical strokes of the digit.
        let x = (200 - 40) / 2 + 40 - 1;
        assert_eq!(*img.get_pixel(x, 70), BLACK);
        assert_eq!(*img.get_pixel(x, 130), BLACK);
    }

    #[test]
    fn tiny_sizes_still_render() {
        for size in 1..=12 {
            let img = render_dummy(88, size);
            assert_eq!(img.dimensions(), (size, size));
        }
        assert_eq!(render_dummy(100, 4).dimensions(), (4, 4));
    }

    #[test]
    fn zero_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dummies");
        let err = create_dummy_images(&out, 2, 0).unwrap_err();
        assert!(matches!(err, Error::Image(_)));
        assert!(!out.exists());
    }

    #[test]
    fn writes_numbered_jpegs() {
        let dir = tempfile::tempdir().unwrap();
        let files = create_dummy_images(dir.path(), 3, 64).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["dummy_01.jpg", "dummy_02.jpg", "dummy_03.jpg"]);
        let decoded = image::open(&files[2]).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }
}
