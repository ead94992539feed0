//! Output formatting and persistence for command results.
//!
//! Supports JSON logging, CSV append of aggregated ratings and plain text
//! listings.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::rating::AggregateRating;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One aggregated rating flattened for CSV.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingRecord {
    pub position: usize,
    pub team: String,
    pub institute: String,
    pub handles: String,
    pub rating: f64,
    pub contests: usize,
    pub qualified: bool,
}

impl RatingRecord {
    pub fn from_aggregate(position: usize, entry: &AggregateRating, qualified: bool) -> Self {
        Self {
            position,
            team: entry.team.name.clone(),
            institute: entry.team.institute.clone(),
            handles: entry.team.handles().join(";"),
            rating: (entry.rating * 100.0).round() / 100.0,
            contests: entry.contests,
            qualified,
        }
    }
}

/// Serializes `value` as pretty-printed JSON to standard output.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a [`RatingRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &RatingRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

/// Writes `lines` to `path`, one per line, creating parent directories.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut body = String::new();
    for line in lines {
        body.push_str(line.as_ref());
        body.push('\n');
    }
    std::fs::write(path, body)?;
    debug!(path = %path.display(), lines = lines.len(), "File written");
    Ok(())
}

/// Creates `dir` if needed and deletes the `.csv` files directly inside it.
///
/// Anything else in the directory is left alone. Returns the number removed.
pub fn clear_csv_files(dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        if is_csv && path.is_file() {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Member, Team};
    use std::collections::BTreeSet;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn entry() -> AggregateRating {
        AggregateRating {
            team: Team {
                name: "Alpha".to_string(),
                institute: "IIT".to_string(),
                members: ["a1", "a2"]
                    .iter()
                    .map(|h| Member {
                        handle: h.to_string(),
                        name: String::new(),
                    })
                    .collect(),
                alts: BTreeSet::new(),
                emails: BTreeSet::new(),
            },
            rating: 1234.5678,
            contests: 6,
        }
    }

    #[test]
    fn test_record_from_aggregate() {
        let record = RatingRecord::from_aggregate(1, &entry(), true);
        assert_eq!(record.handles, "a1;a2");
        assert_eq!(record.rating, 1234.57);
        assert!(record.qualified);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&RatingRecord::default()).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("camp_rater_test_header.csv");
        let _ = fs::remove_file(&path);

        let record = RatingRecord::from_aggregate(1, &entry(), true);
        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("institute")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_lines() {
        let path = env::temp_dir().join("camp_rater_test_lines/IIT.txt");
        write_lines(&path, &["a@x.org", "b@x.org"]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a@x.org\nb@x.org\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_clear_csv_files_keeps_other_files() {
        let dir = env::temp_dir().join("camp_rater_test_clear");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested.csv")).unwrap();
        fs::write(dir.join("IIT.csv"), "a@x.org\n").unwrap();
        fs::write(dir.join("notes.txt"), "keep me\n").unwrap();

        assert_eq!(clear_csv_files(&dir).unwrap(), 1);
        assert!(!dir.join("IIT.csv").exists());
        assert!(dir.join("notes.txt").exists());
        assert!(dir.join("nested.csv").is_dir());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_clear_csv_files_creates_missing_dir() {
        let dir = env::temp_dir().join("camp_rater_test_clear_missing");
        let _ = fs::remove_dir_all(&dir);
        assert_eq!(clear_csv_files(&dir).unwrap(), 0);
        assert!(dir.is_dir());
        fs::remove_dir_all(&dir).unwrap();
    }
}
