use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::docx::Package;
use crate::error::Error;
use crate::model::{Length, Run};

use super::Replacements;

/// Width used by [`replace_first_image`] when the old picture has no extent (5.33").
pub const SINGLE_IMAGE_FALLBACK: Length = Length::emu(4_873_752);
/// Width used by [`replace_all_images`] when the old picture has no extent (2").
pub const POOL_IMAGE_FALLBACK: Length = Length::emu(1_828_800);

const POOL_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Replace every paragraph containing `placeholder` with a single inline
/// picture `width` wide. Whatever else the paragraph held is dropped; only
/// its paragraph properties survive.
///
/// Returns the number of paragraphs replaced. The image is only added to the
/// package when at least one paragraph matches.
pub fn insert_image(
    package: &mut Package,
    placeholder: &str,
    image: &Path,
    width: Length,
) -> Result<usize, Error> {
    if !image.is_file() {
        return Err(Error::MissingResource(image.to_path_buf()));
    }
    if placeholder.is_empty() {
        return Ok(0);
    }

    let (document, media) = package.parts_mut();
    let mut targets = 0;
    document.visit_paragraphs(|p| {
        if p.text().contains(placeholder) {
            targets += 1;
        }
    });
    if targets == 0 {
        return Ok(0);
    }

    let embedded = media.embed(image)?;
    document.visit_paragraphs_mut(|p| {
        if p.text().contains(placeholder) {
            p.clear();
            p.push_run(media.image_run(&embedded, width));
        }
    });
    Ok(targets)
}

/// Insert each `(placeholder, path)` of `images`, resolving paths against
/// `root`. A missing or unreadable image skips that placeholder only.
pub fn insert_images(
    package: &mut Package,
    images: &[(String, String)],
    root: &Path,
    width: Length,
) -> Replacements {
    let mut result = Replacements::default();
    for (placeholder, value) in images {
        let path = root.join(value);
        match insert_image(package, placeholder, &path, width) {
            Ok(count) => result.record(placeholder, count, "image"),
            Err(Error::MissingResource(missing)) => {
                log::warn!("Image file '{}' not found", missing.display());
                result.counts.push((placeholder.clone(), 0));
            }
            Err(e) => {
                log::warn!(
                    "Could not insert '{}' for '{}': {}",
                    path.display(),
                    placeholder,
                    e
                );
                result.counts.push((placeholder.clone(), 0));
            }
        }
    }
    result
}

/// Swap the first picture in the document for `image`, keeping the old
/// picture's display width. Returns `false` when the document has no picture.
pub fn replace_first_image(package: &mut Package, image: &Path) -> Result<bool, Error> {
    if !image.is_file() {
        return Err(Error::MissingResource(image.to_path_buf()));
    }
    let (document, media) = package.parts_mut();
    let mut found = false;
    document.visit_paragraphs(|p| found |= p.runs().any(Run::is_image));
    if !found {
        log::warn!("No existing image found to replace");
        return Ok(false);
    }

    let embedded = media.embed(image)?;
    let mut done = false;
    document.visit_paragraphs_mut(|p| {
        if done {
            return;
        }
        if let Some(run) = p.runs_mut().find(|r| r.is_image()) {
            let width = match run.image_width() {
                Some(width) => {
                    log::info!(
                        "Replaced image with {} (kept width {:.2}\")",
                        embedded.file_name,
                        width.as_inches()
                    );
                    width
                }
                None => {
                    log::info!(
                        "Replaced image with {} (fallback width)",
                        embedded.file_name
                    );
                    SINGLE_IMAGE_FALLBACK
                }
            };
            *run = media.image_run(&embedded, width);
            done = true;
        }
    });
    Ok(true)
}

/// Replace every picture in document order with the next file of `pool`,
/// keeping each old picture's width. Stops when the pool runs out; the
/// remaining pictures are left as they are. Returns the pool files used, in
/// the order their pictures appear.
pub fn replace_all_images(
    package: &mut Package,
    pool: &ImagePool,
) -> Result<Vec<PathBuf>, Error> {
    if pool.is_empty() {
        return Err(Error::EmptyImagePool(pool.dir.clone()));
    }
    log::info!("Found {} replacement images", pool.len());

    let (document, media) = package.parts_mut();
    let mut targets = 0;
    document.visit_paragraphs(|p| targets += p.runs().filter(|r| r.is_image()).count());

    let usable = targets.min(pool.len());
    let embedded = pool.files[..usable]
        .iter()
        .map(|file| media.embed(file))
        .collect::<Result<Vec<_>, _>>()?;

    let mut next = 0;
    document.visit_paragraphs_mut(|p| {
        for run in p.runs_mut() {
            if next == embedded.len() {
                return;
            }
            if !run.is_image() {
                continue;
            }
            let image = &embedded[next];
            let width = run.image_width().unwrap_or(POOL_IMAGE_FALLBACK);
            *run = media.image_run(image, width);
            next += 1;
            log::info!("Image {}: replaced with {}", next, image.file_name);
        }
    });

    if targets > next {
        log::info!(
            "Image pool exhausted; {} image(s) left untouched",
            targets - next
        );
    }
    Ok(pool.files[..next].to_vec())
}

/// Numbered replacement images, in natural order (`dummy_2` before `dummy_10`).
#[derive(Clone, Debug)]
pub struct ImagePool {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl ImagePool {
    pub fn from_dir(dir: &Path) -> Result<Self, Error> {
        if !dir.is_dir() {
            return Err(Error::MissingResource(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_pool_image(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| natural_cmp(a, b));
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
        })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_pool_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| POOL_EXTENSIONS.iter().any(|p| p.eq_ignore_ascii_case(ext)))
}

fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    let a_name = a.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let b_name = b.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let extract = |s: &str| -> (String, u64, String) {
        let start = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let end = s[start..]
            .find(|c: char| !c.is_ascii_digit())
            .map_or(s.len(), |n| start + n);
        (
            s[..start].to_lowercase(),
            s[start..end].parse().unwrap_or(0),
            s[end..].to_string(),
        )
    };
    extract(a_name)
        .cmp(&extract(b_name))
        .then_with(|| a_name.cmp(b_name))
}
