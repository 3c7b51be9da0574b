//! Single-document fill from JSON placeholder maps.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::docx::Package;
use crate::error::Error;
use crate::merge::{self, LineMode, Mapping, Replacements};
use crate::model::Length;

/// Width of images inserted by [`fill_template`] unless overridden.
pub const DEFAULT_IMAGE_WIDTH: Length = Length::emu(731_520);

/// Read a JSON object of placeholder → value. Key order is kept; non-string
/// values are written as their JSON text.
pub fn load_mapping(path: &Path) -> Result<Mapping, Error> {
    if !path.is_file() {
        return Err(Error::MissingResource(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    let mapping = parse_mapping(&text)?;
    log::info!("Loaded {} entries from {}", mapping.len(), path.display());
    Ok(mapping)
}

pub fn parse_mapping(text: &str) -> Result<Mapping, Error> {
    let object: Map<String, Value> = serde_json::from_str(text)?;
    Ok(object
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

#[derive(Clone, Debug)]
pub struct FillOptions {
    pub line_mode: LineMode,
    pub image_width: Length,
    /// Directory that image paths are resolved against.
    pub image_root: PathBuf,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            line_mode: LineMode::Breaks,
            image_width: DEFAULT_IMAGE_WIDTH,
            image_root: PathBuf::from("."),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FillReport {
    pub text: Replacements,
    pub images: Replacements,
}

/// Copy `template` to `output` with `text` placeholders resolved and `images`
/// placeholders replaced by pictures.
pub fn fill_template(
    template: &Path,
    output: &Path,
    text: &[(String, String)],
    images: &[(String, String)],
    options: &FillOptions,
) -> Result<FillReport, Error> {
    let mut package = Package::open(template)?;
    let text = merge::resolve(package.document_mut(), text, options.line_mode)?;
    let images = merge::insert_images(
        &mut package,
        images,
        &options.image_root,
        options.image_width,
    );
    package.save(output)?;
    log::info!("Document saved as {}", output.display());
    Ok(FillReport { text, images })
}
