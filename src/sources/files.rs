//! CSV file backend: one directory per machine under the data folder, any
//! number of `*.csv` exports inside. Files are loaded independently,
//! normalized with full column retention, and concatenated as a schema
//! union; a file that fails to load is skipped, not fatal.

use crate::aggregator;
use crate::config::SourcesConfig;
use crate::dates::ResolvedWindow;
use crate::error::InsightError;
use crate::models::{FetchedData, FileInfo, FileSlice, Table};
use crate::normalizer::{self, RawRow, RetentionPolicy};
use crate::sources::DataSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::glob;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(config: &SourcesConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
        }
    }

    /// CSV files for one machine with filename-derived metadata, sorted by
    /// (year, month) where the `<month>_<year>` filename convention holds.
    pub fn machine_files(&self, machine: &str) -> Vec<FileInfo> {
        let machine_dir = self.data_dir.join(machine);
        if !machine_dir.is_dir() {
            return Vec::new();
        }

        let pattern = machine_dir.join("*.csv");
        let mut files = Vec::new();
        if let Ok(paths) = glob(&pattern.to_string_lossy()) {
            for path in paths.flatten() {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let metadata = std::fs::metadata(&path).ok();
                let modified = metadata
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
                files.push(FileInfo {
                    month_year: parse_month_year(&filename),
                    path: path.to_string_lossy().into_owned(),
                    size: metadata.map(|m| m.len()).unwrap_or(0),
                    modified,
                    filename,
                });
            }
        }

        files.sort_by_key(|f| f.month_year.map(|(m, y)| (y, m)).unwrap_or((0, 0)));
        files
    }

    fn load_slice(&self, path: &Path) -> Result<(FileSlice, Table), InsightError> {
        let rows = read_csv_rows(path)?;
        let table = normalizer::normalize(&rows, RetentionPolicy::RetainAll);
        let slice = FileSlice {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            records: table.len() as u64,
            columns: column_names(&table),
            date_range: aggregator::date_range(&table),
            summary: aggregator::summarize(&table),
        };
        Ok((slice, table))
    }
}

#[async_trait]
impl DataSource for FileStore {
    async fn fetch(
        &self,
        machine: &str,
        window: Option<&ResolvedWindow>,
    ) -> Result<FetchedData, InsightError> {
        let mut combined = Table::default();
        let mut files = Vec::new();

        for info in self.machine_files(machine) {
            match self.load_slice(Path::new(&info.path)) {
                Ok((slice, table)) => {
                    debug!(file = %info.filename, records = table.len(), "loaded machine file");
                    files.push(slice);
                    combined.merge(table);
                }
                Err(err) => {
                    warn!(file = %info.filename, %err, "skipping unreadable file");
                }
            }
        }

        if let Some(window) = window {
            let (start, end) = window.bounds();
            combined
                .rows
                .retain(|row| row.date.is_some_and(|d| d >= start && d <= end));
        }

        Ok(FetchedData { files, combined })
    }

    async fn list_machines(&self) -> Result<Vec<String>, InsightError> {
        let mut machines = Vec::new();
        if self.data_dir.is_dir() {
            for entry in std::fs::read_dir(&self.data_dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if entry.path().is_dir() && name.starts_with('M') {
                    machines.push(name);
                }
            }
        }
        machines.sort_by_key(|name| (leading_number(name), name.clone()));
        Ok(machines)
    }
}

/// Natural sort key so M2 sorts before M10.
fn leading_number(name: &str) -> u64 {
    name.chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Parse `<month>_<year>` filename stems like `june_2024.csv`.
fn parse_month_year(filename: &str) -> Option<(u32, i32)> {
    let stem = filename.strip_suffix(".csv").unwrap_or(filename);
    let (month_part, year_part) = stem.rsplit_once('_')?;
    let month_name = month_part.rsplit('_').next()?.to_lowercase();
    let month = match month_name.as_str() {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    let year: i32 = year_part.parse().ok()?;
    Some((month, year))
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRow>, InsightError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn column_names(table: &Table) -> Vec<String> {
    use crate::models::ColumnId;
    table
        .columns
        .iter()
        .map(|col| match col {
            ColumnId::Date => crate::schema::DATE_COLUMN.to_string(),
            ColumnId::Status => crate::schema::STATUS_COLUMN.to_string(),
            ColumnId::Maintenance => crate::schema::MAINTENANCE_COLUMN.to_string(),
            ColumnId::Metric(metric) => metric.name().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MetricColumn;
    use std::fs;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileStore {
        FileStore::new(&SourcesConfig {
            backend: "files".to_string(),
            data_dir: dir.path().to_path_buf(),
        })
    }

    fn write_machine_csv(dir: &TempDir, machine: &str, filename: &str, content: &str) {
        let machine_dir = dir.path().join(machine);
        fs::create_dir_all(&machine_dir).unwrap();
        fs::write(machine_dir.join(filename), content).unwrap();
    }

    #[tokio::test]
    async fn test_list_machines_natural_sort() {
        let dir = TempDir::new().unwrap();
        for machine in ["M10", "M2", "M1", "notes"] {
            fs::create_dir_all(dir.path().join(machine)).unwrap();
        }
        let machines = store(&dir).list_machines().await.unwrap();
        assert_eq!(machines, vec!["M1", "M2", "M10"]);
    }

    #[tokio::test]
    async fn test_fetch_concatenates_schema_union() {
        let dir = TempDir::new().unwrap();
        write_machine_csv(
            &dir,
            "M1",
            "may_2024.csv",
            "date,Ai_partcount,avg_oee\n2024-05-01,100,80\n",
        );
        write_machine_csv(
            &dir,
            "M1",
            "june_2024.csv",
            "date,Ai_partcount,avg_total_energy\n2024-06-01,50,7.5\n",
        );

        let fetched = store(&dir).fetch("M1", None).await.unwrap();
        assert_eq!(fetched.combined.len(), 2);
        assert_eq!(fetched.files.len(), 2);
        // Union of both file schemas.
        assert!(fetched
            .combined
            .has_column(crate::models::ColumnId::Metric(MetricColumn::AvgOee)));
        assert!(fetched
            .combined
            .has_column(crate::models::ColumnId::Metric(MetricColumn::AvgTotalEnergy)));
    }

    #[tokio::test]
    async fn test_fetch_window_filters_rows() {
        let dir = TempDir::new().unwrap();
        write_machine_csv(
            &dir,
            "M1",
            "mixed.csv",
            "date,Ai_partcount\n2024-05-01,100\n2024-06-15,50\n,25\n",
        );

        let window = ResolvedWindow { month: 6, year: 2024 };
        let fetched = store(&dir).fetch("M1", Some(&window)).await.unwrap();
        assert_eq!(fetched.combined.len(), 1);
        assert_eq!(
            fetched.combined.metric_sum(MetricColumn::AiPartcount),
            50.0
        );
    }

    #[tokio::test]
    async fn test_fetch_missing_machine_is_empty_not_error() {
        let dir = TempDir::new().unwrap();
        let fetched = store(&dir).fetch("M99", None).await.unwrap();
        assert!(fetched.combined.is_empty());
        assert!(fetched.files.is_empty());
    }

    #[test]
    fn test_parse_month_year() {
        assert_eq!(parse_month_year("june_2024.csv"), Some((6, 2024)));
        assert_eq!(parse_month_year("report_sept_2022.csv"), Some((9, 2022)));
        assert_eq!(parse_month_year("telemetry.csv"), None);
    }

    #[test]
    fn test_machine_files_sorted_by_period() {
        let dir = TempDir::new().unwrap();
        write_machine_csv(&dir, "M1", "june_2024.csv", "date\n");
        write_machine_csv(&dir, "M1", "feb_2024.csv", "date\n");
        write_machine_csv(&dir, "M1", "dec_2023.csv", "date\n");

        let files = store(&dir).machine_files("M1");
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["dec_2023.csv", "feb_2024.csv", "june_2024.csv"]);
    }
}
