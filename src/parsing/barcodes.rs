//! Parser for reference barcode list files.
//!
//! One barcode per line, either bare:
//!
//! ```text
//! ACGTACGT
//! TTTTACGT
//! ```
//!
//! or labeled, label first:
//!
//! ```text
//! sample_1<TAB>ACGTACGT
//! sample_2<TAB>TTTTACGT
//! ```
//!
//! Blank lines and `#` comments are ignored. A file must stick to one of
//! the two forms.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarcodeFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("barcode file has no barcodes")]
    Empty,

    #[error("line {line}: expected 'label<TAB>sequence' or a bare sequence, found {fields} fields")]
    InvalidLine { line: usize, fields: usize },

    #[error("line {line} mixes labeled and bare barcodes")]
    MixedFormat { line: usize },
}

/// A parsed barcode list: sequences in file order, with labels iff the file
/// was labeled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeFile {
    pub sequences: Vec<String>,
    pub labels: Option<Vec<String>>,
}

impl BarcodeFile {
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

/// Read a barcode list from a file.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, or any [`parse_barcodes`] error.
pub fn read_barcodes(path: &Path) -> Result<BarcodeFile, BarcodeFileError> {
    let reader = BufReader::new(File::open(path)?);
    parse_barcodes(reader)
}

/// Parse a barcode list from any buffered reader.
///
/// # Errors
///
/// Returns `Empty` if no barcode lines remain after stripping comments and
/// blanks, `InvalidLine` on a line with more than two fields, or
/// `MixedFormat` when labeled and bare lines appear in one file.
pub fn parse_barcodes<R: BufRead>(reader: R) -> Result<BarcodeFile, BarcodeFileError> {
    let mut sequences = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut labeled: Option<bool> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let number = i + 1;

        let fields: Vec<&str> = line.split('\t').collect();
        let has_label = match fields.len() {
            1 => false,
            2 => true,
            n => return Err(BarcodeFileError::InvalidLine { line: number, fields: n }),
        };

        match labeled {
            None => labeled = Some(has_label),
            Some(expected) if expected != has_label => {
                return Err(BarcodeFileError::MixedFormat { line: number });
            }
            Some(_) => {}
        }

        if has_label {
            labels.push(fields[0].to_string());
            sequences.push(fields[1].to_string());
        } else {
            sequences.push(fields[0].to_string());
        }
    }

    if sequences.is_empty() {
        return Err(BarcodeFileError::Empty);
    }

    Ok(BarcodeFile {
        sequences,
        labels: if labeled == Some(true) { Some(labels) } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bare_list() {
        let file = parse_barcodes(Cursor::new("ACGT\nTTTT\n")).unwrap();
        assert_eq!(file.sequences, vec!["ACGT", "TTTT"]);
        assert!(file.labels.is_none());
    }

    #[test]
    fn test_labeled_list() {
        let file = parse_barcodes(Cursor::new("s1\tACGT\ns2\tTTTT\n")).unwrap();
        assert_eq!(file.sequences, vec!["ACGT", "TTTT"]);
        assert_eq!(file.labels, Some(vec!["s1".to_string(), "s2".to_string()]));
    }

    #[test]
    fn test_comments_and_blanks_ignored() {
        let file = parse_barcodes(Cursor::new("# header\n\nACGT\n\n# trailer\nTTTT\n")).unwrap();
        assert_eq!(file.len(), 2);
    }

    #[test]
    fn test_mixed_format_rejected() {
        let err = parse_barcodes(Cursor::new("ACGT\ns2\tTTTT\n")).unwrap_err();
        assert!(matches!(err, BarcodeFileError::MixedFormat { line: 2 }));
    }

    #[test]
    fn test_too_many_fields_rejected() {
        let err = parse_barcodes(Cursor::new("s1\tACGT\textra\n")).unwrap_err();
        assert!(matches!(err, BarcodeFileError::InvalidLine { line: 1, fields: 3 }));
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(matches!(
            parse_barcodes(Cursor::new("# nothing here\n")),
            Err(BarcodeFileError::Empty)
        ));
    }

    #[test]
    fn test_read_from_disk() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"s1\tACGT\ns2\tGGCC\n").unwrap();
        tmp.flush().unwrap();

        let file = read_barcodes(tmp.path()).unwrap();
        assert_eq!(file.sequences, vec!["ACGT", "GGCC"]);
        assert_eq!(file.labels.as_ref().unwrap().len(), 2);
    }
}
