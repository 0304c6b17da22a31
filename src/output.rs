//! CSV persistence shared by every stage.
//!
//! Files are always written with a header row, even when there are no data
//! rows, and never with an index column.

use csv::{StringRecord, WriterBuilder};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Serializes `rows` under an explicit `header`, replacing any existing file.
///
/// Parent directories are created as needed.
pub fn write_records<T, I>(path: impl AsRef<Path>, header: &[&str], rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let path = path.as_ref();
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(create(path)?);

    writer.write_record(header)?;
    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = count, "CSV written");
    Ok(count)
}

/// Writes raw string records under `headers`, replacing any existing file.
pub fn write_table(path: impl AsRef<Path>, headers: &StringRecord, rows: &[StringRecord]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WriterBuilder::new().from_writer(create(path)?);

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Serialize)]
    struct Row {
        a: u32,
        b: &'static str,
    }

    #[test]
    fn test_write_records_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let n = write_records(&path, &["a", "b"], vec![Row { a: 1, b: "x" }]).unwrap();

        assert_eq!(n, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n1,x\n");
    }

    #[test]
    fn test_write_records_header_without_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_records(&path, &["a", "b"], Vec::<Row>::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a,b\n");
    }

    #[test]
    fn test_write_records_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_records(&path, &["a", "b"], vec![Row { a: 1, b: "x" }]).unwrap();
        write_records(&path, &["a", "b"], vec![Row { a: 2, b: "y" }]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with("2,y\n"));
    }

    #[test]
    fn test_write_table_quotes_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let headers = StringRecord::from(vec!["name", "x"]);
        let rows = vec![StringRecord::from(vec!["King's Cross, St Pancras", "1.5"])];

        write_table(&path, &headers, &rows).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "name,x\n\"King's Cross, St Pancras\",1.5\n"
        );
    }
}
