//! Named batch configurations compiled into the binary.

use std::path::PathBuf;

use crate::error::Error;
use crate::model::Length;

/// How a column name and a row position combine into a placeholder key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyFormat {
    pub separator: String,
    /// Positions are zero-padded to at least this many digits.
    pub index_width: usize,
}

impl Default for KeyFormat {
    fn default() -> Self {
        Self {
            separator: String::new(),
            index_width: 2,
        }
    }
}

impl KeyFormat {
    /// `("Name", 3)` → `name03` with the default format.
    pub fn key(&self, column: &str, position: usize) -> String {
        format!(
            "{}{}{:0width$}",
            column.to_lowercase(),
            self.separator,
            position,
            width = self.index_width
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub name: String,
    pub dataset: PathBuf,
    pub template: PathBuf,
    /// Rows per generated document.
    pub group_size: usize,
    pub output_prefix: String,
    pub image_column: String,
    pub id_column: String,
    pub key_format: KeyFormat,
    pub image_width: Length,
    /// Directory that image-column values are resolved against.
    pub image_root: PathBuf,
    pub output_dir: PathBuf,
}

impl Profile {
    fn builtin(name: &str, template: &str, group_size: usize, prefix: &str, width: f64) -> Self {
        Self {
            name: name.to_string(),
            dataset: PathBuf::from("data/attendees.csv"),
            template: PathBuf::from("templates").join(template),
            group_size,
            output_prefix: prefix.to_string(),
            image_column: "Image".to_string(),
            id_column: "id".to_string(),
            key_format: KeyFormat::default(),
            image_width: Length::inches(width),
            image_root: PathBuf::from("."),
            output_dir: PathBuf::from("output"),
        }
    }

    /// Output document path for the 1-based group `index`.
    pub fn output_path(&self, index: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}_{:02}.docx", self.output_prefix, index))
    }
}

pub fn builtin_profiles() -> Vec<Profile> {
    vec![
        Profile::builtin("badges", "Badges.docx", 30, "Badges", 0.8),
        Profile::builtin("passes", "Passes.docx", 10, "Passes", 1.2),
        Profile::builtin("gafetes", "Gafetes.docx", 5, "Gafetes", 0.8),
    ]
}

pub fn profile(name: &str) -> Result<Profile, Error> {
    builtin_profiles()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| Error::UnknownProfile(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_format_pads_to_two_digits() {
        let format = KeyFormat::default();
        assert_eq!(format.key("Name", 1), "name01");
        assert_eq!(format.key("Image", 30), "image30");
        assert_eq!(format.key("Title", 123), "title123");
    }

    #[test]
    fn custom_key_format() {
        let format = KeyFormat {
            separator: "_".into(),
            index_width: 3,
        };
        assert_eq!(format.key("Company", 7), "company_007");
    }

    #[test]
    fn selects_builtin_by_name() {
        let p = profile("gafetes").unwrap();
        assert_eq!(p.group_size, 5);
        assert_eq!(p.image_width, Length::inches(0.8));
        assert_eq!(
            p.output_path(3),
            PathBuf::from("output").join("Gafetes_03.docx")
        );
        assert!(profile("BADGES").is_ok());
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let err = profile("posters").unwrap_err();
        assert!(matches!(err, Error::UnknownProfile(name) if name == "posters"));
    }

    #[test]
    fn builtin_names_are_unique() {
        let profiles = builtin_profiles();
        for (i, a) in profiles.iter().enumerate() {
            assert!(profiles[i + 1..].iter().all(|b| b.name != a.name));
        }
    }
}
