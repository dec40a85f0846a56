use crate::domain::model::Row;
use crate::domain::ports::{OpenedTable, RawRow, TableSink, TableSource};
use crate::utils::error::{EtlError, Result};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// `.tsv` files are tab separated, everything else comma separated.
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

// 非 UTF-8 的位元組以 U+FFFD 取代；日期欄因此解析失敗而視為空值
fn cell(value: &[u8]) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(value).into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let delimiter = delimiter_for(&path);
        Self { path, delimiter }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSource for CsvSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<OpenedTable<'_>> {
        if !self.path.is_file() {
            return Err(EtlError::SourceNotFound { path: self.name() });
        }

        let path = self.name();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_path(&self.path)
            .map_err(|source| EtlError::ReadError {
                path: path.clone(),
                source,
            })?;

        let columns = reader
            .headers()
            .map_err(|source| EtlError::ReadError {
                path: path.clone(),
                source,
            })?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let rows = reader.into_byte_records().map(move |record| {
            let record = record.map_err(|source| EtlError::ReadError {
                path: path.clone(),
                source,
            })?;
            Ok(record.iter().map(cell).collect::<RawRow>())
        });

        Ok(OpenedTable {
            columns,
            rows: Box::new(rows),
        })
    }
}

/// Writes to a temporary file next to the destination and persists it over
/// the destination on success, so readers never see a half-written file.
/// The temporary file is removed when anything fails.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
    delimiter: u8,
}

impl CsvSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let delimiter = delimiter_for(&path);
        Self { path, delimiter }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the destination, created when missing.
    fn target_dir(&self) -> Result<&Path> {
        match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|source| EtlError::FileIoError {
                    path: parent.display().to_string(),
                    source,
                })?;
                Ok(parent)
            }
            None => Ok(Path::new(".")),
        }
    }
}

impl TableSink for CsvSink {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn write_table(&self, columns: &[String], rows: &[Row]) -> Result<usize> {
        let dir = self.target_dir()?;
        let name = self.name();

        let temp = NamedTempFile::new_in(dir).map_err(|source| EtlError::FileIoError {
            path: dir.display().to_string(),
            source,
        })?;
        tracing::debug!("Writing {} rows to {}", rows.len(), temp.path().display());

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(BufWriter::new(temp));

        writer
            .write_record(columns)
            .map_err(|source| EtlError::WriteError {
                path: name.clone(),
                source,
            })?;

        for row in rows {
            // 長度以表頭為準，缺的欄位寫成空字串
            let record = (0..columns.len()).map(|idx| row.value(idx).unwrap_or(""));
            writer
                .write_record(record)
                .map_err(|source| EtlError::WriteError {
                    path: name.clone(),
                    source,
                })?;
        }

        let buffered = writer.into_inner().map_err(|e| EtlError::FileIoError {
            path: name.clone(),
            source: e.into_error(),
        })?;
        let temp = buffered.into_inner().map_err(|e| EtlError::FileIoError {
            path: name.clone(),
            source: e.into_error(),
        })?;
        temp.persist(&self.path).map_err(|e| EtlError::FileIoError {
            path: name,
            source: e.error,
        })?;

        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Schema;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_delimiter_follows_extension() {
        assert_eq!(delimiter_for(Path::new("log.csv")), b',');
        assert_eq!(delimiter_for(Path::new("log.TSV")), b'\t');
        assert_eq!(delimiter_for(Path::new("log")), b',');
    }

    #[test]
    fn test_source_reads_header_and_null_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "\u{feff}start_date, user ,ip\n2019-01-05,ana,\n,beto,10.0.0.1\n").unwrap();

        let source = CsvSource::new(&path);
        let table = source.open().unwrap();
        assert_eq!(table.columns, vec!["start_date", "user", "ip"]);

        let rows: Vec<RawRow> = table.rows.collect::<Result<_>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][2], None);
        assert_eq!(rows[1][0], None);
        assert_eq!(rows[1][2], Some("10.0.0.1".to_string()));
    }

    #[test]
    fn test_missing_source_is_reported_with_path() {
        let dir = TempDir::new().unwrap();
        let source = CsvSource::new(dir.path().join("bd_automatas.csv"));

        match source.open().err().unwrap() {
            EtlError::SourceNotFound { path } => assert!(path.ends_with("bd_automatas.csv")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ragged_row_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(&path, "start_date,user\n2019-01-05,ana\n2019-01-06\n").unwrap();

        let source = CsvSource::new(&path);
        let rows: Vec<Result<RawRow>> = source.open().unwrap().rows.collect();
        assert!(rows[0].is_ok());
        assert!(matches!(rows[1], Err(EtlError::ReadError { .. })));
    }

    #[test]
    fn test_sink_writes_atomically_into_new_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("out.tsv");
        let schema = Arc::new(Schema::new(vec!["start_date".into(), "user".into()]));
        let rows = vec![
            Row::new(Arc::clone(&schema), vec![Some("2019-01-05".into()), None]),
            Row::new(Arc::clone(&schema), vec![Some("2019-01-06".into()), Some("a, b".into())]),
        ];

        let written = CsvSink::new(&path)
            .write_table(schema.columns(), &rows)
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "start_date\tuser\n2019-01-05\t\n2019-01-06\ta, b\n"
        );
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_unwritable_sink_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        // 目的地是一個已存在的目錄，persist 會失敗
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep.txt"), "x").unwrap();

        let err = CsvSink::new(&path).write_table(&["a".to_string()], &[]).unwrap_err();

        assert!(matches!(err, EtlError::FileIoError { .. }));
        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("taken")]);
    }

    #[test]
    fn test_export_leaves_sibling_files_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let sibling = dir.path().join(".out.csv.partial");
        fs::write(&sibling, "borrador del usuario").unwrap();
        fs::write(&path, "old,content\n").unwrap();

        let schema = Arc::new(Schema::new(vec!["start_date".into()]));
        let rows = vec![Row::new(Arc::clone(&schema), vec![Some("2019-01-05".into())])];
        CsvSink::new(&path).write_table(schema.columns(), &rows).unwrap();

        assert_eq!(fs::read_to_string(&sibling).unwrap(), "borrador del usuario");
        assert_eq!(fs::read_to_string(&path).unwrap(), "start_date\n2019-01-05\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_invalid_utf8_cell_does_not_abort_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.csv");
        fs::write(
            &path,
            b"start_date,user\n2019-01-05,ana\n2019-01-0\xff,beto\n2019-01-06,carla\n",
        )
        .unwrap();

        let rows: Vec<RawRow> = CsvSource::new(&path)
            .open()
            .unwrap()
            .rows
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][1], Some("beto".to_string()));
        let date = rows[1][0].as_deref().unwrap();
        assert!(date.contains('\u{fffd}'));
        assert_eq!(crate::core::calendar::parse_date(date), None);
    }
}
