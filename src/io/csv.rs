//! Delimited-text reading and writing

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::analysis::GeneTermResult;
use crate::data::{LongRecord, LongTable};
use crate::error::{LimmaError, Result};
use crate::tidy::Glance;

/// A delimited table before any interpretation of its columns
#[derive(Debug, Clone)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Index of a named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }
}

/// Parse tab-delimited text with a header line.
///
/// Every data row must have as many fields as the header; blank lines are skipped.
pub fn read_raw_table(text: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if header.iter().all(|h| h.is_empty()) {
        return Err(LimmaError::EmptyData {
            reason: "Expression table has no header".to_string(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    Ok(RawTable { header, rows })
}

fn tsv_writer<P: AsRef<Path>>(path: P) -> Result<csv::Writer<File>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)?)
}

fn write_rows<P: AsRef<Path>, T: Serialize>(path: P, rows: &[T]) -> Result<()> {
    let mut writer = tsv_writer(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the cleaned long table, one row per gene × nutrient × rate
pub fn write_long_table<P: AsRef<Path>>(path: P, table: &LongTable) -> Result<()> {
    write_rows::<_, LongRecord>(path, table.records())
}

/// Write analysed tidy rows (split keys and adjusted p-values)
pub fn write_results<P: AsRef<Path>>(path: P, rows: &[GeneTermResult]) -> Result<()> {
    write_rows(path, rows)
}

/// Write the model summary as pretty-printed JSON
pub fn write_glance<P: AsRef<Path>>(path: P, glance: &Glance) -> Result<()> {
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, glance)?;
    writeln!(file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Nutrient;

    #[test]
    fn test_read_raw_table() {
        let text = "GID\tYORF\tNAME\tGWEIGHT\tG0.05\tG0.1\n\
                    GENE1\tA\tSFB2 || ER to Golgi transport || molecular function unknown || YNL049C || 1082129\t1\t-0.24\t-0.13\n";
        let raw = read_raw_table(text).unwrap();
        assert_eq!(raw.header.len(), 6);
        assert_eq!(raw.n_rows(), 1);
        assert_eq!(raw.column_index("NAME"), Some(2));
        assert_eq!(raw.rows[0][5], "-0.13");
    }

    #[test]
    fn test_ragged_row_rejected() {
        let text = "GID\tNAME\tG0.05\nGENE1\tx\n";
        assert!(matches!(read_raw_table(text), Err(LimmaError::CsvError(_))));
    }

    #[test]
    fn test_write_long_table_header() {
        let table = LongTable::new(vec![LongRecord {
            name: "SFB2".to_string(),
            biological_process: "ER to Golgi transport".to_string(),
            molecular_function: "molecular function unknown".to_string(),
            systematic_name: "YNL049C".to_string(),
            nutrient: Nutrient::Glucose,
            rate: 0.05,
            expression: -0.24,
        }]);
        let file = tempfile::NamedTempFile::new().unwrap();
        write_long_table(file.path(), &table).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name\tBP\tMF\tsystematic_name\tnutrient\trate\texpression"
        );
        assert_eq!(
            lines.next().unwrap(),
            "SFB2\tER to Golgi transport\tmolecular function unknown\tYNL049C\tGlucose\t0.05\t-0.24"
        );
    }

    #[test]
    fn test_write_results_header() {
        let rows = vec![GeneTermResult {
            systematic_name: "YAL001C".to_string(),
            nutrient: Nutrient::Leucine,
            term: "rate".to_string(),
            estimate: 8.0,
            std_error: 0.5,
            statistic: 16.0,
            p_value: 0.001,
            p_adjusted: 0.002,
        }];
        let file = tempfile::NamedTempFile::new().unwrap();
        write_results(file.path(), &rows).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "systematic_name\tnutrient\tterm\testimate\tstd.error\tstatistic\tp.value\tp.adjusted"
        );
        let fields: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(fields.len(), 8);
        assert_eq!(&fields[..3], &["YAL001C", "Leucine", "rate"]);
        assert_eq!(fields[6].parse::<f64>().unwrap(), 0.001);
        assert!(lines.next().is_none());
    }
}
