//! Artifact writing helpers.

use std::fs;
use std::io;
use std::path::Path;

/// Write bytes with write-then-rename, so readers never see a half-written
/// artifact. The temporary file sits next to `path` with a `.tmp` extension.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Serialize rows as CSV into memory. Nothing touches disk until the
/// whole table is built.
pub fn csv_bytes<I, R>(rows: I) -> crate::error::PostsimResult<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_overwrites_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("organized_outputs.csv");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn csv_bytes_quotes_fields_with_commas() {
        let bytes = csv_bytes(vec![vec!["a,b", "c"], vec!["1", "2"]]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "\"a,b\",c\n1,2\n");
    }
}
