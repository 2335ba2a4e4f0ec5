//! Face detection and annotation.
//!
//! Faces are found on a grayscale copy of the image through a pluggable
//! [`FaceDetector`], outlined with a 2-pixel blue box on the color image, and
//! the result is written into an output directory under the input's file name.

use std::path::{Path, PathBuf};

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::{Error, Result};

/// Directory used when no output directory is given.
pub const DEFAULT_FACES_DIR: &str = "detected-faces";

const BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Bounding box of a detected face, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Box width.
    pub width: u32,
    /// Box height.
    pub height: u32,
}

/// Pluggable face detection backend.
///
/// Implementations may keep scratch state between calls, hence `&mut self`.
pub trait FaceDetector {
    /// Detect faces in a grayscale image.
    fn detect(&mut self, gray: &GrayImage) -> Vec<FaceBox>;
}

/// SeetaFace cascade detector backed by `rustface`.
pub struct SeetaDetector {
    inner: Box<dyn rustface::Detector>,
}

impl SeetaDetector {
    /// Load a SeetaFace model file with the default tuning
    /// (min face 20 px, score threshold 2.0, pyramid scale 0.8, step 4x4).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the path is not UTF-8 or the model cannot be read.
    pub fn from_model(path: &Path) -> Result<Self> {
        let model = path
            .to_str()
            .ok_or_else(|| Error::Model(format!("non UTF-8 model path: {}", path.display())))?;
        let mut inner =
            rustface::create_detector(model).map_err(|e| Error::Model(e.to_string()))?;

        inner.set_min_face_size(20);
        inner.set_score_thresh(2.0);
        inner.set_pyramid_scale_factor(0.8);
        inner.set_slide_window_step(4, 4);

        Ok(Self { inner })
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(&mut self, gray: &GrayImage) -> Vec<FaceBox> {
        let mut data = rustface::ImageData::new(gray.as_raw(), gray.width(), gray.height());
        self.inner
            .detect(&mut data)
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                }
            })
            .collect()
    }
}

/// Summary of one annotated image.
#[derive(Debug, Clone)]
pub struct FaceReport {
    /// Detected faces.
    pub faces: Vec<FaceBox>,
    /// Where the annotated copy was written.
    pub output: PathBuf,
}

/// Detect faces and outline each one on `image`.
pub fn annotate_faces(image: &mut RgbImage, detector: &mut dyn FaceDetector) -> Vec<FaceBox> {
    let gray = image::imageops::grayscale(image);
    let faces = detector.detect(&gray);

    for face in &faces {
        if face.width == 0 || face.height == 0 {
            continue;
        }
        draw_hollow_rect_mut(
            image,
            Rect::at(face.x, face.y).of_size(face.width, face.height),
            BOX_COLOR,
        );
        if face.width > 2 && face.height > 2 {
            draw_hollow_rect_mut(
                image,
                Rect::at(face.x + 1, face.y + 1).of_size(face.width - 2, face.height - 2),
                BOX_COLOR,
            );
        }
    }

    log::info!("Found faces : {}", faces.len());
    faces
}

/// Output path for the annotated copy of `input`.
///
/// The file name is the last `/` or `\` separated component of `input`. A
/// missing or empty `save_dir`, or the literal default name, maps to
/// `./detected-faces`.
#[must_use]
pub fn face_output_path(input: &Path, save_dir: Option<&Path>) -> PathBuf {
    let raw = input.to_string_lossy();
    let file_name = raw
        .trim_matches(|c| c == '/' || c == '\\')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let dir = match save_dir {
        Some(dir) if !dir.as_os_str().is_empty() && dir != Path::new(DEFAULT_FACES_DIR) => {
            dir.to_path_buf()
        }
        _ => Path::new(".").join(DEFAULT_FACES_DIR),
    };
    dir.join(file_name)
}

/// Load `input`, annotate detected faces, and save the copy.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded, the output directory
/// cannot be created, or the annotated image cannot be saved.
pub fn detect_and_save(
    input: &Path,
    save_dir: Option<&Path>,
    detector: &mut dyn FaceDetector,
) -> Result<FaceReport> {
    log::info!("Face detection started: {}", input.display());

    let mut rgb = image::open(input)?.to_rgb8();
    let faces = annotate_faces(&mut rgb, detector);

    let output = face_output_path(input, save_dir);
    if let Some(parent) = output.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    rgb.save(&output)?;

    log::info!("Face detection completed: {}", output.display());
    Ok(FaceReport { faces, output })
}
