use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no viewing history file found (tried: {})", display_paths(.searched))]
    NoSourceFound { searched: Vec<PathBuf> },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One data row of the input, as an ordered mapping of header name to cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A loaded input file.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub sha256: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Return the first candidate that exists as a regular file.
///
/// Relative candidates resolve against `base_dir`.
pub fn discover(candidates: &[PathBuf], base_dir: &Path) -> Result<PathBuf, SourceError> {
    let mut searched = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let path = if candidate.is_absolute() {
            candidate.clone()
        } else {
            base_dir.join(candidate)
        };
        debug!("checking candidate {}", path.display());
        if path.is_file() {
            return Ok(path);
        }
        searched.push(path);
    }
    Err(SourceError::NoSourceFound { searched })
}

pub fn read_source(path: &Path) -> Result<SourceTable, SourceError> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    let sha256 = crate::util::hash_bytes(&bytes);
    let (headers, rows) = read_rows(bytes.as_slice())?;
    Ok(SourceTable {
        path: path.to_path_buf(),
        sha256,
        headers,
        rows,
    })
}

/// Read a headered delimited stream into raw rows.
pub fn read_rows<R: Read>(reader: R) -> Result<(Vec<String>, Vec<RawRow>), SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            if idx == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = RawRow::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string())),
        );
        rows.push(row);
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_rows_in_order() {
        let data = "\u{feff}Title,Date\n\"Show: Part 1\",1/2/24\nFilm (1999), 1/3/24 \n";
        let (headers, rows) = read_rows(data.as_bytes()).expect("read");
        assert_eq!(headers, vec!["Title", "Date"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Title"), Some("Show: Part 1"));
        assert_eq!(rows[1].get("Date"), Some("1/3/24"));
    }

    #[test]
    fn short_rows_lack_trailing_columns() {
        let data = "Title,Date,Profile Name\nA,2024-01-01\n";
        let (_, rows) = read_rows(data.as_bytes()).expect("read");
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0].get("Profile Name"), None);
    }

    #[test]
    fn headers_only_is_empty() {
        let (headers, rows) = read_rows("Title,Date\n".as_bytes()).expect("read");
        assert_eq!(headers.len(), 2);
        assert!(rows.is_empty());
    }

    #[test]
    fn discover_picks_first_existing() {
        let dir = tempdir().expect("tempdir");
        std::fs::write(dir.path().join("sample_data.csv"), "Title,Date\n").expect("write");
        std::fs::write(dir.path().join("viewing-history.csv"), "Title,Date\n").expect("write");
        let candidates = vec![
            PathBuf::from("NetflixViewingHistory.csv"),
            PathBuf::from("sample_data.csv"),
            PathBuf::from("viewing-history.csv"),
        ];
        let found = discover(&candidates, dir.path()).expect("found");
        assert_eq!(found, dir.path().join("sample_data.csv"));
    }

    #[test]
    fn discover_reports_every_candidate() {
        let dir = tempdir().expect("tempdir");
        let candidates = vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")];
        match discover(&candidates, dir.path()) {
            Err(SourceError::NoSourceFound { searched }) => {
                assert_eq!(searched, vec![dir.path().join("a.csv"), dir.path().join("b.csv")]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn discover_skips_directories() {
        let dir = tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("sample_data.csv")).expect("mkdir");
        let candidates = vec![PathBuf::from("sample_data.csv")];
        assert!(discover(&candidates, dir.path()).is_err());
    }
}
