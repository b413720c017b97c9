use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::info;

use super::Table;
use crate::error::CliError;

/// Destination for tabular exports.
pub trait SpreadsheetWriter {
    /// Write one dataset to `path`.
    fn write_table(&self, path: &Path, table: &Table) -> Result<(), CliError>;

    /// Write one file per sheet, named `<stem>-<sheet>`. Returns the paths
    /// in sheet order.
    fn write_sheets(
        &self,
        dir: &Path,
        stem: &str,
        sheets: &IndexMap<String, Table>,
    ) -> Result<Vec<PathBuf>, CliError>;
}

/// Comma-separated output with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl SpreadsheetWriter for CsvWriter {
    fn write_table(&self, path: &Path, table: &Table) -> Result<(), CliError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_path(path)?;
        writer.write_record(&table.headers)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = table.len(), "wrote CSV");
        Ok(())
    }

    fn write_sheets(
        &self,
        dir: &Path,
        stem: &str,
        sheets: &IndexMap<String, Table>,
    ) -> Result<Vec<PathBuf>, CliError> {
        sheets
            .iter()
            .map(|(sheet, table)| {
                let path = dir.join(format!("{stem}-{sheet}.csv"));
                self.write_table(&path, table)?;
                Ok(path)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        Table {
            headers: vec!["name".into(), "CPUUsage".into()],
            rows: vec![
                vec![Some("DC-1".into()), Some("12.5".into())],
                vec![Some("Branch, 2".into()), None],
            ],
        }
    }

    #[test]
    fn writes_headers_and_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.csv");
        CsvWriter.write_table(&path, &table()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "name,CPUUsage\nDC-1,12.5\n\"Branch, 2\",\n");
    }

    #[test]
    fn one_file_per_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut sheets = IndexMap::new();
        sheets.insert("sites".to_owned(), table());
        sheets.insert("elements".to_owned(), Table::default());

        let paths = CsvWriter.write_sheets(dir.path(), "inventory", &sheets).unwrap();
        assert_eq!(
            paths,
            vec![
                dir.path().join("inventory-sites.csv"),
                dir.path().join("inventory-elements.csv"),
            ]
        );
        assert!(paths.iter().all(|p| p.exists()));
    }
}
