use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tga::TgaEncoder;
use image::{ColorType, ImageEncoder};
use serde::{Deserialize, Serialize};

use crate::canvas::{Image, Layer, PixelBuffer};
use crate::error::ProjectFileError;
use crate::project::Project;

// ============================================================================
// SAVE FORMATS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SaveFormat {
    #[default]
    Png,
    Jpeg,
    Bmp,
    Tga,
    /// Native layered project file (`.lpf`).
    Project,
}

impl SaveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Png => "png",
            SaveFormat::Jpeg => "jpg",
            SaveFormat::Bmp => "bmp",
            SaveFormat::Tga => "tga",
            SaveFormat::Project => "lpf",
        }
    }

    pub fn supports_quality(&self) -> bool {
        matches!(self, SaveFormat::Jpeg)
    }

    /// Parse a format name or file extension, case-insensitively.
    pub fn from_name(name: &str) -> Option<SaveFormat> {
        match name.to_lowercase().as_str() {
            "png" => Some(SaveFormat::Png),
            "jpg" | "jpeg" => Some(SaveFormat::Jpeg),
            "bmp" => Some(SaveFormat::Bmp),
            "tga" => Some(SaveFormat::Tga),
            "lpf" => Some(SaveFormat::Project),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<SaveFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(SaveFormat::from_name)
    }
}

// ============================================================================
// LPF PROJECT FILE FORMAT
// ============================================================================

const LPF_MAGIC_V1: &str = "LPF1";

/// Maximum supported canvas dimension in pixels (per axis).
/// Prevents memory exhaustion from crafted project files.
const MAX_CANVAS_DIM: u32 = 32_768;
/// Maximum number of layers in a project file.
const MAX_LAYERS: usize = 256;

#[derive(Serialize, Deserialize)]
pub(crate) struct ProjectFileV1 {
    magic: String,
    width: u32,
    height: u32,
    active_layer_index: usize,
    layers: Vec<LayerDataV1>,
}

/// One layer: placement plus its full raw RGBA buffer.
#[derive(Serialize, Deserialize)]
struct LayerDataV1 {
    name: String,
    visible: bool,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

pub(crate) fn build_lpf_v1(image: &Image, active_layer: Option<usize>) -> ProjectFileV1 {
    let layers = image
        .layers()
        .iter()
        .map(|layer| LayerDataV1 {
            name: layer.name.clone(),
            visible: layer.visible,
            x: layer.x,
            y: layer.y,
            width: layer.width() as u32,
            height: layer.height() as u32,
            pixels: layer.pixels.as_bytes().to_vec(),
        })
        .collect();

    ProjectFileV1 {
        magic: LPF_MAGIC_V1.to_string(),
        width: image.width() as u32,
        height: image.height() as u32,
        active_layer_index: active_layer.unwrap_or(0),
        layers,
    }
}

/// Save a project's layers as a `.lpf` file.
pub fn save_lpf(project: &Project, path: &Path) -> Result<(), ProjectFileError> {
    let file = build_lpf_v1(&project.image, project.active_layer());
    let writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(writer, &file)?;
    tracing::info!(
        "saved project {} ({} layers)",
        path.display(),
        project.image.len()
    );
    Ok(())
}

/// Load a `.lpf` file. Returns the image and the stored active layer index,
/// clamped to the layer count (`None` when the file has no layers).
pub fn load_lpf(path: &Path) -> Result<(Image, Option<usize>), ProjectFileError> {
    let raw = std::fs::read(path)?;
    if raw.len() < 12 {
        return Err(ProjectFileError::InvalidFormat("File too small".into()));
    }

    // bincode writes a String as an 8-byte length prefix followed by UTF-8,
    // so the 4-char magic sits at bytes 8..12.
    let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
    if magic != LPF_MAGIC_V1 {
        return Err(ProjectFileError::InvalidFormat(format!(
            "Unknown magic '{}'",
            magic
        )));
    }

    let file: ProjectFileV1 = bincode::deserialize(&raw)?;
    image_from_lpf(file)
}

fn check_dims(what: &str, width: u32, height: u32) -> Result<(), ProjectFileError> {
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(ProjectFileError::InvalidFormat(format!(
            "{} size {}x{} exceeds maximum allowed {}x{}",
            what, width, height, MAX_CANVAS_DIM, MAX_CANVAS_DIM
        )));
    }
    Ok(())
}

fn image_from_lpf(file: ProjectFileV1) -> Result<(Image, Option<usize>), ProjectFileError> {
    check_dims("Canvas", file.width, file.height)?;
    if file.layers.len() > MAX_LAYERS {
        return Err(ProjectFileError::InvalidFormat(format!(
            "Project contains {} layers, which exceeds the maximum of {}",
            file.layers.len(),
            MAX_LAYERS
        )));
    }

    let mut image = Image::new(file.width as i32, file.height as i32)?;
    for ld in file.layers {
        check_dims(&format!("Layer '{}'", ld.name), ld.width, ld.height)?;
        let expected = ld.width as usize * ld.height as usize * 4;
        if ld.pixels.len() != expected {
            return Err(ProjectFileError::InvalidFormat(format!(
                "Layer '{}' has {} bytes, expected {}",
                ld.name,
                ld.pixels.len(),
                expected
            )));
        }

        let pixels = PixelBuffer::from_rgba(ld.width as i32, ld.height as i32, ld.pixels)?;
        let mut layer = Layer::with_pixels(ld.name, pixels);
        layer.visible = ld.visible;
        layer.x = ld.x;
        layer.y = ld.y;
        image.add_layer(layer);
    }

    let active = image
        .len()
        .checked_sub(1)
        .map(|last| file.active_layer_index.min(last));
    Ok((image, active))
}

// ============================================================================
// SYNCHRONOUS IMAGE LOADER
// ============================================================================

/// Synchronously load a file into a [`Project`].
///
/// - `.lpf` keeps every layer and the stored active layer.
/// - Anything the `image` crate decodes becomes a single layer named after
///   the file stem.
pub fn load_image_sync(path: &Path) -> Result<Project, ProjectFileError> {
    if SaveFormat::from_path(path) == Some(SaveFormat::Project) {
        let (image, active) = load_lpf(path)?;
        let mut project = Project::from_image(path.to_path_buf(), image);
        if let Some(index) = active {
            project.select_layer(index)?;
        }
        return Ok(project);
    }

    let img = image::open(path)?.to_rgba8();
    let (w, h) = (img.width(), img.height());
    check_dims("Image", w, h)?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Background")
        .to_string();

    let layer = Layer::from_rgba(name, w as i32, h as i32, img.as_raw())?;
    let mut image = Image::new(w as i32, h as i32)?;
    image.add_layer(layer);

    tracing::info!("loaded {} ({}x{})", path.display(), w, h);
    Ok(Project::from_image(path.to_path_buf(), image))
}

// ============================================================================
// IMAGE ENCODING
// ============================================================================

/// Encode a flattened buffer and write it to `path`. `quality` only affects
/// JPEG. [`SaveFormat::Project`] is rejected here; use [`save_lpf`].
pub fn encode_and_write(
    buffer: &PixelBuffer,
    path: &Path,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ProjectFileError> {
    let (w, h) = (buffer.width() as u32, buffer.height() as u32);

    if format == SaveFormat::Project {
        return Err(ProjectFileError::InvalidFormat(
            "project files hold layers; save them with save_lpf".into(),
        ));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        SaveFormat::Png => {
            PngEncoder::new(&mut writer).write_image(buffer.as_bytes(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Jpeg => {
            let rgb: Vec<u8> = buffer
                .as_bytes()
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(&rgb, w, h, ColorType::Rgb8)?;
        }
        SaveFormat::Bmp => {
            let mut encoder = BmpEncoder::new(&mut writer);
            encoder.encode(buffer.as_bytes(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Tga => {
            let encoder = TgaEncoder::new(&mut writer);
            encoder.encode(buffer.as_bytes(), w, h, ColorType::Rgba8)?;
        }
        SaveFormat::Project => {}
    }

    tracing::info!("wrote {} as {:?}", path.display(), format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, Point};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("layerpaint-io-{}-{}", std::process::id(), name))
    }

    #[test]
    fn format_names_and_extensions() {
        assert_eq!(SaveFormat::from_name("JPEG"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_name("jpg"), Some(SaveFormat::Jpeg));
        assert_eq!(SaveFormat::from_name("gif"), None);
        assert_eq!(SaveFormat::from_path(Path::new("a/b.LPF")), Some(SaveFormat::Project));
        assert_eq!(SaveFormat::Project.extension(), "lpf");
        assert!(SaveFormat::Jpeg.supports_quality());
        assert!(!SaveFormat::Png.supports_quality());
    }

    #[test]
    fn lpf_round_trip_keeps_layers_and_placement() {
        let mut project = Project::new_untitled(1, 6, 4).unwrap();
        project.add_layer();
        {
            let layer = project.image.layer_mut(1).unwrap();
            layer.pixels.set(2, 1, Color::rgb(1, 2, 3));
            layer.translate(-2, 3);
            layer.visible = false;
        }
        project.select_layer(0).unwrap();

        let path = temp_path("roundtrip.lpf");
        save_lpf(&project, &path).unwrap();
        let loaded = load_image_sync(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.image, project.image);
        assert_eq!(loaded.active_layer(), Some(0));
        assert_eq!(loaded.image.layer(1).unwrap().position(), Point::new(-2, 3));
    }

    #[test]
    fn lpf_rejects_bad_magic_and_short_files() {
        let path = temp_path("bad.lpf");
        std::fs::write(&path, b"short").unwrap();
        assert!(matches!(load_lpf(&path), Err(ProjectFileError::InvalidFormat(_))));

        let mut file = build_lpf_v1(&Image::new(1, 1).unwrap(), None);
        file.magic = "NOPE".into();
        std::fs::write(&path, bincode::serialize(&file).unwrap()).unwrap();
        assert!(matches!(load_lpf(&path), Err(ProjectFileError::InvalidFormat(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn lpf_validation_limits() {
        let mut file = build_lpf_v1(&Image::new(1, 1).unwrap(), None);
        file.width = MAX_CANVAS_DIM + 1;
        assert!(image_from_lpf(file).is_err());

        let mut image = Image::new(2, 2).unwrap();
        image.add_layer(Layer::new("a", 2, 2).unwrap());
        let mut file = build_lpf_v1(&image, Some(0));
        file.layers[0].pixels.pop();
        assert!(matches!(image_from_lpf(file), Err(ProjectFileError::InvalidFormat(_))));

        let mut file = build_lpf_v1(&Image::new(1, 1).unwrap(), None);
        for _ in 0..=MAX_LAYERS {
            file.layers.push(LayerDataV1 {
                name: "x".into(),
                visible: true,
                x: 0,
                y: 0,
                width: 0,
                height: 0,
                pixels: Vec::new(),
            });
        }
        assert!(image_from_lpf(file).is_err());
    }

    #[test]
    fn png_export_reloads_as_single_layer() {
        let mut project = Project::new_untitled(1, 3, 2).unwrap();
        project.image.layer_mut(0).unwrap().pixels.fill_all(Color::new(10, 20, 30, 255));
        let path = temp_path("flat.png");
        encode_and_write(&project.composite(), &path, SaveFormat::Png, 90).unwrap();

        let loaded = load_image_sync(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!((loaded.image.width(), loaded.image.height()), (3, 2));
        assert_eq!(loaded.image.len(), 1);
        assert_eq!(
            loaded.image.layer(0).unwrap().pixels.get(2, 1),
            Some(Color::new(10, 20, 30, 255))
        );
        assert_eq!(loaded.history.len(), 1);
    }

    #[test]
    fn project_format_is_not_a_raster_encoding() {
        let buf = PixelBuffer::new(1, 1).unwrap();
        let path = temp_path("never.lpf");
        assert!(encode_and_write(&buf, &path, SaveFormat::Project, 90).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_reports_error() {
        assert!(load_image_sync(Path::new("/definitely/not/here.png")).is_err());
    }
}
