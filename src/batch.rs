//! Dataset rows → one generated document per group of rows.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::convert::Converter;
use crate::docx::Package;
use crate::error::Error;
use crate::merge::{self, LineMode, Mapping};
use crate::profile::{KeyFormat, Profile};

/// A CSV table held in memory: header names and string cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_csv(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Err(Error::MissingResource(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let columns = reader.headers()?.iter().map(String::from).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(String::from).collect());
        }
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Which columns feed images, which are skipped, and how keys are spelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRoles {
    pub image_column: String,
    pub id_column: String,
    pub key_format: KeyFormat,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            image_column: "Image".to_string(),
            id_column: "id".to_string(),
            key_format: KeyFormat::default(),
        }
    }
}

impl From<&Profile> for ColumnRoles {
    fn from(profile: &Profile) -> Self {
        Self {
            image_column: profile.image_column.clone(),
            id_column: profile.id_column.clone(),
            key_format: profile.key_format.clone(),
        }
    }
}

/// Placeholder maps for one generated document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupMaps {
    pub text: Mapping,
    pub images: Mapping,
    pub rows: usize,
}

/// Split the dataset into consecutive groups of at most `group_size` rows
/// and build each group's text and image maps. Rows are numbered from 1
/// within their group.
pub fn group_rows(dataset: &Dataset, group_size: usize, roles: &ColumnRoles) -> Vec<GroupMaps> {
    let image_index = dataset.column_index(&roles.image_column);
    dataset
        .rows
        .chunks(group_size.max(1))
        .map(|chunk| {
            let mut group = GroupMaps {
                rows: chunk.len(),
                ..Default::default()
            };
            for (position, row) in (1..).zip(chunk) {
                for (index, column) in dataset.columns.iter().enumerate() {
                    if *column == roles.image_column || *column == roles.id_column {
                        continue;
                    }
                    let key = roles.key_format.key(column, position);
                    group.text.push((key, cell(row, index).to_string()));
                }
                if let Some(index) = image_index {
                    let key = roles.key_format.key(&roles.image_column, position);
                    let path = image_lookup_path(cell(row, index));
                    group.images.push((key, path.to_string()));
                }
            }
            group
        })
        .collect()
}

/// Image paths in datasets are often written rooted (`/images/a.jpg`); they
/// are always looked up relative to the image root.
pub fn image_lookup_path(value: &str) -> &str {
    value.trim_start_matches(['/', '\\'])
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map_or("", String::as_str)
}

/// Outcome of a batch run. Per-group and conversion failures are collected
/// here instead of aborting the run.
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    pub documents: Vec<PathBuf>,
    pub pdfs: Vec<PathBuf>,
    /// 1-based group index and the error that abandoned it.
    pub failed_groups: Vec<(usize, String)>,
    pub conversion_failures: Vec<(PathBuf, String)>,
    /// Text and image placeholders that matched nowhere, summed over groups.
    pub unmatched: usize,
}

/// Generate every document of `profile`. A missing template or dataset
/// aborts the run; anything that goes wrong inside one group only skips
/// that group. PDFs are produced when a `converter` is given.
pub fn run_batch(profile: &Profile, converter: Option<&dyn Converter>) -> Result<BatchReport, Error> {
    let t0 = Instant::now();

    if !profile.template.is_file() {
        return Err(Error::MissingResource(profile.template.clone()));
    }
    let template = std::fs::read(&profile.template)?;
    Package::from_bytes(&template)?;
    let dataset = Dataset::from_csv(&profile.dataset)?;
    let groups = group_rows(&dataset, profile.group_size, &ColumnRoles::from(profile));
    let t_load = t0.elapsed();

    log::info!(
        "Profile '{}': {} rows in groups of {} → {} document(s)",
        profile.name,
        dataset.len(),
        profile.group_size,
        groups.len()
    );

    let mut report = BatchReport::default();
    for (i, group) in groups.iter().enumerate() {
        let index = i + 1;
        let output = profile.output_path(index);
        log::info!("Group {}: {} row(s) → {}", index, group.rows, output.display());

        match generate(&template, group, profile, &output) {
            Ok(unmatched) => {
                report.unmatched += unmatched;
                report.documents.push(output.clone());
            }
            Err(e) => {
                log::error!("Group {} failed: {}", index, e);
                report.failed_groups.push((index, e.to_string()));
                continue;
            }
        }

        if let Some(converter) = converter {
            let pdf = output.with_extension("pdf");
            match converter.convert(&output, &pdf) {
                Ok(()) => {
                    log::info!("Converted to {}", pdf.display());
                    report.pdfs.push(pdf);
                }
                Err(e) => {
                    log::warn!("PDF conversion failed for {}: {}", output.display(), e);
                    report.conversion_failures.push((output, e.to_string()));
                }
            }
        }
    }

    let t_total = t0.elapsed();
    log::info!(
        "Timing: load={:.1}ms, generate={:.1}ms, total={:.1}ms ({} documents, {} pdfs)",
        t_load.as_secs_f64() * 1000.0,
        (t_total - t_load).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        report.documents.len(),
        report.pdfs.len(),
    );
    Ok(report)
}

fn generate(
    template: &[u8],
    group: &GroupMaps,
    profile: &Profile,
    output: &Path,
) -> Result<usize, Error> {
    let mut package = Package::from_bytes(template)?;
    let text = merge::resolve(package.document_mut(), &group.text, LineMode::Breaks)?;
    let images = merge::insert_images(
        &mut package,
        &group.images,
        &profile.image_root,
        profile.image_width,
    );
    package.save(output)?;
    Ok(text.missing().count() + images.missing().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(rows: usize) -> Dataset {
        let mut csv = String::from("id,Name,Title,Image\n");
        for i in 1..=rows {
            csv.push_str(&format!("{i},Person {i},Role {i},/images/p{i}.jpg\n"));
        }
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn thirty_three_rows_make_two_groups() {
        let groups = group_rows(&dataset(33), 30, &ColumnRoles::default());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].rows, 30);
        assert_eq!(groups[1].rows, 3);
        assert_eq!(groups[1].text[0], ("name01".to_string(), "Person 31".to_string()));
        assert_eq!(groups[1].images.len(), 3);
    }

    #[test]
    fn id_and_image_columns_stay_out_of_text_map() {
        let groups = group_rows(&dataset(2), 5, &ColumnRoles::default());
        let keys: Vec<&str> = groups[0].text.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["name01", "title01", "name02", "title02"]);
        assert_eq!(
            groups[0].images,
            [
                ("image01".to_string(), "images/p1.jpg".to_string()),
                ("image02".to_string(), "images/p2.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn leading_separators_are_stripped() {
        assert_eq!(image_lookup_path("/images/a.jpg"), "images/a.jpg");
        assert_eq!(image_lookup_path("\\images\\a.jpg"), "images\\a.jpg");
        assert_eq!(image_lookup_path("images/a.jpg"), "images/a.jpg");
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        let data = Dataset::from_reader("Name,Company\nAda\n".as_bytes()).unwrap();
        let groups = group_rows(&data, 10, &ColumnRoles::default());
        assert_eq!(groups[0].text[1], ("company01".to_string(), String::new()));
        assert!(groups[0].images.is_empty());
    }

    #[test]
    fn zero_group_size_is_treated_as_one() {
        let groups = group_rows(&dataset(3), 0, &ColumnRoles::default());
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn missing_dataset_is_a_missing_resource() {
        let err = Dataset::from_csv(Path::new("no/such.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingResource(_)));
    }
}
