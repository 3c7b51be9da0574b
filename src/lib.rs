mod batch;
mod convert;
mod docx;
mod dummy;
mod error;
mod fill;
mod merge;
mod model;
mod profile;
mod xml;

#[cfg(test)]
mod testutil;

pub use batch::{
    BatchReport, ColumnRoles, Dataset, GroupMaps, group_rows, image_lookup_path, run_batch,
};
pub use convert::{Converter, OfficeConverter};
pub use docx::{EmbeddedImage, Media, Package};
pub use dummy::{create_dummy_images, render_dummy};
pub use error::Error;
pub use fill::{
    DEFAULT_IMAGE_WIDTH, FillOptions, FillReport, fill_template, load_mapping, parse_mapping,
};
pub use merge::{
    ImagePool, LineMode, Mapping, Replacements, RunMatch, insert_image, insert_images, locate,
    replace_all_images, replace_first_image, resolve, splice,
};
pub use model::{
    Block, Document, Length, Paragraph, ParagraphItem, RowItem, Run, RunContent, RunFormat,
    RunGroup, Table, TableCell, TableItem, TableRow,
};
pub use profile::{KeyFormat, Profile, builtin_profiles, profile};

use std::path::Path;
use std::time::Instant;

/// Replace the first picture of `input` with `image` and save to `output`.
/// Returns `false` (and writes nothing) when `input` has no picture.
pub fn replace_image_in_file(input: &Path, output: &Path, image: &Path) -> Result<bool, Error> {
    let t0 = Instant::now();
    let mut package = Package::open(input)?;
    if !replace_first_image(&mut package, image)? {
        return Ok(false);
    }
    package.save(output)?;
    log::info!(
        "Timing: total={:.1}ms → {}",
        t0.elapsed().as_secs_f64() * 1000.0,
        output.display()
    );
    Ok(true)
}

/// Replace every picture of `input`, in order, with the images in `pool_dir`
/// and save to `output`. Returns the number of pictures replaced.
pub fn replace_images_in_file(input: &Path, output: &Path, pool_dir: &Path) -> Result<usize, Error> {
    let t0 = Instant::now();
    let pool = ImagePool::from_dir(pool_dir)?;
    let mut package = Package::open(input)?;
    let used = replace_all_images(&mut package, &pool)?;
    package.save(output)?;
    log::info!(
        "Timing: total={:.1}ms ({} of {} pool images used) → {}",
        t0.elapsed().as_secs_f64() * 1000.0,
        used.len(),
        pool.len(),
        output.display()
    );
    Ok(used.len())
}

/// Replace every paragraph of `input` containing `placeholder` with `image`
/// and save to `output`. Returns the number of paragraphs replaced.
pub fn insert_image_in_file(
    input: &Path,
    output: &Path,
    placeholder: &str,
    image: &Path,
    width: Length,
) -> Result<usize, Error> {
    let mut package = Package::open(input)?;
    let count = insert_image(&mut package, placeholder, image, width)?;
    if count == 0 {
        log::warn!("'{}' not found in document", placeholder);
    }
    package.save(output)?;
    Ok(count)
}
