#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic noise; compresses badly, so sizes react to quality.
pub fn noisy_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed | 1;
    let img = RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn write_jpeg(dir: &Path, name: &str, img: &DynamicImage, quality: u8) -> PathBuf {
    let path = dir.join(name);
    let file = File::create(&path).unwrap();
    JpegEncoder::new_with_quality(file, quality)
        .encode_image(&img.to_rgb8())
        .unwrap();
    path
}

pub fn write_with_format(dir: &Path, name: &str, img: &DynamicImage, format: ImageFormat) -> PathBuf {
    let path = dir.join(name);
    img.save_with_format(&path, format).unwrap();
    path
}

pub fn write_garbage(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    File::create(&path)
        .unwrap()
        .write_all(b"fake image data")
        .unwrap();
    path
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn create_input_directory(temp_dir: &Path) -> PathBuf {
    let input_dir = temp_dir.join("input");
    fs::create_dir(&input_dir).unwrap();
    input_dir
}

pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).unwrap().len()
}

pub fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
