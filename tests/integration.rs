use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use transparency_sieve::store::{LocalStore, MemoryStore, ObjectStore};
use transparency_sieve::{
    check_directory, classify, transfer, ColorMode, DecodeError, DecodedImage, Outcome,
    TransferOptions,
};

const TWO_COLORS: [u8; 6] = [255, 0, 0, 0, 0, 255];

fn indexed_png(width: u32, height: u32, trns: Option<&[u8]>, indices: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(TWO_COLORS.to_vec());
        if let Some(trns) = trns {
            encoder.set_trns(trns.to_vec());
        }
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(indices).unwrap();
    }
    out
}

fn gray_png_with_color_key() -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, 2, 2);
        encoder.set_color(png::ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_trns(vec![0, 200]);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[10, 20, 30, 40]).unwrap();
    }
    out
}

fn indexed_gif(transparent: Option<u8>, indices: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, 2, 2, &TWO_COLORS).unwrap();
        let frame = gif::Frame::from_indexed_pixels(2, 2, indices, transparent);
        encoder.write_frame(&frame).unwrap();
    }
    out
}

/// A 2x2 screen over a four-color palette whose only frame is the single
/// bottom-right pixel. The encoder always writes background index 0.
fn offset_gif(transparent: Option<u8>, frame_index: u8) -> Vec<u8> {
    let palette = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, 2, 2, &palette).unwrap();
        let mut frame = gif::Frame::from_indexed_pixels(1, 1, vec![frame_index], transparent);
        frame.left = 1;
        frame.top = 1;
        encoder.write_frame(&frame).unwrap();
    }
    out
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn rgba_png_with_alpha(alpha: u8) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(3, 3, Rgba([200, 200, 200, 255]));
    img.put_pixel(1, 1, Rgba([200, 200, 200, alpha]));
    encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}

fn opaque_rgb_png() -> Vec<u8> {
    encode(&DynamicImage::new_rgb8(3, 3), ImageFormat::Png)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tsieve-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn indexed_png_using_transparent_index_is_transparent() {
    let bytes = indexed_png(2, 2, Some(&[255, 0]), &[0, 1, 0, 0]);
    assert!(classify(&bytes).unwrap());
}

#[test]
fn indexed_png_not_using_transparent_index_is_opaque() {
    let bytes = indexed_png(2, 2, Some(&[255, 0]), &[0, 0, 0, 0]);
    assert!(!classify(&bytes).unwrap());
}

#[test]
fn indexed_png_without_trns_is_opaque() {
    let bytes = indexed_png(2, 2, None, &[0, 1, 1, 0]);
    assert!(!classify(&bytes).unwrap());
}

#[test]
fn indexed_png_exposes_native_view() {
    let bytes = indexed_png(2, 2, Some(&[255, 0]), &[0, 1, 1, 1]);
    let image = DecodedImage::decode(&bytes).unwrap();

    assert_eq!(image.mode(), ColorMode::Indexed);
    assert_eq!(image.transparent_index(), Some(1));
    assert!(image.transparency().is_none());

    let colors = image.colors().unwrap();
    assert_eq!(colors.len(), 2);
    assert_eq!((colors[0].index, colors[0].count), (0, 1));
    assert_eq!((colors[1].index, colors[1].count), (1, 3));

    // the RGBA view still reflects the tRNS table
    assert_eq!(image.extrema()[3], (0, 255));
}

#[test]
fn partial_palette_alpha_is_metadata_regardless_of_pixels() {
    let bytes = indexed_png(2, 2, Some(&[255, 128]), &[0, 0, 0, 0]);
    assert!(classify(&bytes).unwrap());
}

#[test]
fn gray_color_key_is_metadata_regardless_of_pixels() {
    let bytes = gray_png_with_color_key();
    let image = DecodedImage::decode(&bytes).unwrap();
    assert_eq!(image.mode(), ColorMode::Gray);
    assert!(image.transparency().is_some());
    assert!(classify(&bytes).unwrap());
}

#[test]
fn gif_transparent_index_follows_palette_usage() {
    assert!(classify(&indexed_gif(Some(1), &[0, 1, 0, 0])).unwrap());
    assert!(!classify(&indexed_gif(Some(1), &[0, 0, 0, 0])).unwrap());
    assert!(!classify(&indexed_gif(None, &[0, 1, 0, 1])).unwrap());
}

#[test]
fn gif_native_mode_is_indexed() {
    let image = DecodedImage::decode(&indexed_gif(Some(0), &[1, 1, 1, 1])).unwrap();
    assert_eq!(image.mode(), ColorMode::Indexed);
    assert_eq!(image.transparent_index(), Some(0));
    assert_eq!(image.colors().unwrap().len(), 1);
}

#[test]
fn gif_area_outside_frame_takes_transparent_background() {
    let bytes = offset_gif(Some(0), 1);
    let image = DecodedImage::decode(&bytes).unwrap();
    assert_eq!((image.width(), image.height()), (2, 2));
    assert_eq!(image.transparent_index(), Some(0));

    let colors = image.colors().unwrap();
    assert_eq!(colors.len(), 2);
    assert_eq!((colors[0].index, colors[0].count), (0, 3));
    assert_eq!((colors[1].index, colors[1].count), (1, 1));

    assert!(classify(&bytes).unwrap());
}

#[test]
fn gif_area_outside_frame_with_opaque_background() {
    let bytes = offset_gif(Some(2), 1);
    let image = DecodedImage::decode(&bytes).unwrap();
    assert_eq!(image.transparent_index(), Some(2));

    let colors = image.colors().unwrap();
    assert_eq!(colors.len(), 2);
    assert_eq!((colors[0].index, colors[0].count), (0, 3));
    assert_eq!((colors[1].index, colors[1].count), (1, 1));

    assert!(!classify(&bytes).unwrap());
}

#[test]
fn rgba_alpha_minimum_decides() {
    assert!(classify(&rgba_png_with_alpha(254)).unwrap());
    assert!(!classify(&rgba_png_with_alpha(255)).unwrap());
}

#[test]
fn rgb_jpeg_and_bmp_are_opaque() {
    let rgb = DynamicImage::new_rgb8(8, 8);
    assert!(!classify(&encode(&rgb, ImageFormat::Jpeg)).unwrap());
    assert!(!classify(&encode(&rgb, ImageFormat::Bmp)).unwrap());
}

#[test]
fn malformed_buffers_fail_instead_of_returning_false() {
    assert!(matches!(classify(&[]), Err(DecodeError::Empty)));
    assert!(classify(b"GIF89a").is_err());

    let png = indexed_png(2, 2, Some(&[255, 0]), &[0, 1, 0, 0]);
    assert!(classify(&png[..png.len() / 2]).is_err());
}

#[test]
fn transfer_copies_only_opaque_images() {
    let store = MemoryStore::new();
    store.put_object("src", "opaque.png", opaque_rgb_png());
    store.put_object("src", "logo.png", rgba_png_with_alpha(0));
    store.put_object("src", "sprites/icon.gif", indexed_gif(Some(1), &[1, 0, 0, 0]));
    store.put_object("src", "sprites/flat.gif", indexed_gif(Some(1), &[0, 0, 0, 0]));
    store.put_object("src", "readme.txt", b"not an image".to_vec());
    store.create_bucket("dst");

    let results = transfer(&store, "src", "dst", &TransferOptions::default()).unwrap();
    let keys: Vec<&str> = results.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "logo.png",
            "opaque.png",
            "readme.txt",
            "sprites/flat.gif",
            "sprites/icon.gif"
        ]
    );

    assert_eq!(results[0].outcome, Outcome::Skipped);
    assert_eq!(results[1].outcome, Outcome::Copied);
    assert!(matches!(results[2].outcome, Outcome::Failed(_)));
    assert_eq!(results[3].outcome, Outcome::Copied);
    assert_eq!(results[4].outcome, Outcome::Skipped);

    assert_eq!(
        store.list_objects("dst").unwrap(),
        vec!["opaque.png", "sprites/flat.gif"]
    );
    assert_eq!(store.get_object("dst", "opaque.png").unwrap(), opaque_rgb_png());
}

#[test]
fn dry_run_copies_nothing() {
    let store = MemoryStore::new();
    store.put_object("src", "opaque.png", opaque_rgb_png());
    store.create_bucket("dst");

    let opts = TransferOptions {
        dry_run: true,
        ..TransferOptions::default()
    };
    let results = transfer(&store, "src", "dst", &opts).unwrap();

    assert_eq!(results[0].outcome, Outcome::Copied);
    assert!(store.list_objects("dst").unwrap().is_empty());
}

#[test]
fn prefix_limits_transferred_keys() {
    let store = MemoryStore::new();
    store.put_object("src", "a/one.png", opaque_rgb_png());
    store.put_object("src", "b/two.png", opaque_rgb_png());
    store.create_bucket("dst");

    let opts = TransferOptions {
        prefix: Some("b/".to_string()),
        ..TransferOptions::default()
    };
    let results = transfer(&store, "src", "dst", &opts).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(store.list_objects("dst").unwrap(), vec!["b/two.png"]);
}

#[test]
fn transfer_between_local_buckets() {
    let root = scratch_dir("transfer");
    std::fs::create_dir_all(root.join("src/nested")).unwrap();
    std::fs::write(root.join("src/nested/opaque.png"), opaque_rgb_png()).unwrap();
    std::fs::write(root.join("src/clear.png"), rgba_png_with_alpha(10)).unwrap();

    let store = LocalStore::new(&root);
    let results = transfer(&store, "src", "dst", &TransferOptions::default()).unwrap();

    assert_eq!(results.len(), 2);
    assert!(root.join("dst/nested/opaque.png").is_file());
    assert!(!root.join("dst/clear.png").exists());

    std::fs::remove_dir_all(&root).unwrap();
}

#[test]
fn check_directory_classifies_supported_files_in_order() {
    let dir = scratch_dir("check");
    std::fs::write(dir.join("b_opaque.png"), opaque_rgb_png()).unwrap();
    std::fs::write(dir.join("a_clear.png"), rgba_png_with_alpha(0)).unwrap();
    std::fs::write(dir.join("c_broken.gif"), b"GIF89a").unwrap();
    std::fs::write(dir.join("notes.txt"), b"skip me").unwrap();

    let results = check_directory(&dir);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].transparent, Some(true));
    assert_eq!(results[1].transparent, Some(false));
    assert_eq!(results[2].transparent, None);
    assert!(!results[2].success());

    std::fs::remove_dir_all(&dir).unwrap();
}
