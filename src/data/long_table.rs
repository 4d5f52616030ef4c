//! Long-form expression records: one row per gene × nutrient × growth rate

use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::nutrient::{parse_sample_column, Nutrient};
use crate::error::{LimmaError, Result};
use crate::io::{read_raw_table, read_text_input, RawTable};

/// Columns of the source table that carry no information needed downstream
const DISCARDED_COLUMNS: [&str; 3] = ["GID", "YORF", "GWEIGHT"];

/// Separator between the parts of the composite NAME column
const NAME_SEPARATOR: &str = "||";

/// Number of parts in a NAME field: name, BP, MF, systematic name, number
const NAME_PARTS: usize = 5;

/// Parameters of the loading/cleaning stage
#[derive(Debug, Clone)]
pub struct LoadParams {
    /// Rows each (systematic name, nutrient) group must have to be kept
    pub expected_replicates: usize,
}

impl Default for LoadParams {
    fn default() -> Self {
        Self {
            expected_replicates: 6,
        }
    }
}

/// One expression measurement with its gene annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub name: String,
    #[serde(rename = "BP")]
    pub biological_process: String,
    #[serde(rename = "MF")]
    pub molecular_function: String,
    pub systematic_name: String,
    pub nutrient: Nutrient,
    pub rate: f64,
    pub expression: f64,
}

/// Cleaned long-form table
#[derive(Debug, Clone, Default)]
pub struct LongTable {
    records: Vec<LongRecord>,
}

/// Annotation columns split out of one NAME field
struct NameParts {
    name: String,
    biological_process: String,
    molecular_function: String,
    systematic_name: String,
}

fn split_name(field: &str, line: usize) -> Result<NameParts> {
    let parts: Vec<&str> = field.split(NAME_SEPARATOR).map(str::trim).collect();
    if parts.len() != NAME_PARTS {
        return Err(LimmaError::MalformedName {
            line,
            reason: format!(
                "expected {} '{}'-separated parts, found {}",
                NAME_PARTS,
                NAME_SEPARATOR,
                parts.len()
            ),
        });
    }
    Ok(NameParts {
        name: parts[0].to_string(),
        biological_process: parts[1].to_string(),
        molecular_function: parts[2].to_string(),
        systematic_name: parts[3].to_string(),
    })
}

/// Parse an expression cell; empty and `NA` cells are missing values
fn parse_expression(cell: &str) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("NA") {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| LimmaError::InvalidSchema {
        reason: format!("Invalid expression value: {}", cell),
    })?;
    Ok(if value.is_finite() { Some(value) } else { None })
}

/// Interpret the raw table: split NAME, drop unused columns, pivot the sample
/// columns to long form and drop rows with missing expression or systematic name.
pub fn clean_raw_table(raw: &RawTable) -> Result<LongTable> {
    let name_idx = raw.column_index("NAME").ok_or_else(|| LimmaError::InvalidSchema {
        reason: "NAME column not found".to_string(),
    })?;

    let mut samples: Vec<(usize, Nutrient, f64)> = Vec::new();
    for (idx, header) in raw.header.iter().enumerate() {
        if idx == name_idx || DISCARDED_COLUMNS.contains(&header.as_str()) {
            continue;
        }
        match parse_sample_column(header) {
            Some((code, rate)) => {
                let nutrient = Nutrient::from_code(code).ok_or_else(|| LimmaError::InvalidSchema {
                    reason: format!("Sample column '{}' has unknown nutrient code '{}'", header, code),
                })?;
                samples.push((idx, nutrient, rate));
            }
            None => warn!("Ignoring unrecognised column '{}'", header),
        }
    }

    if samples.is_empty() {
        return Err(LimmaError::InvalidSchema {
            reason: "No sample columns of the form <nutrient><rate> found".to_string(),
        });
    }

    let mut records = Vec::with_capacity(raw.n_rows() * samples.len());
    let mut dropped_missing = 0usize;
    let mut dropped_unnamed = 0usize;

    for (row_idx, row) in raw.rows.iter().enumerate() {
        // header is line 1
        let parts = split_name(&row[name_idx], row_idx + 2)?;

        for &(col, nutrient, rate) in &samples {
            let Some(expression) = parse_expression(&row[col])? else {
                dropped_missing += 1;
                continue;
            };
            if parts.systematic_name.is_empty() {
                dropped_unnamed += 1;
                continue;
            }
            records.push(LongRecord {
                name: parts.name.clone(),
                biological_process: parts.biological_process.clone(),
                molecular_function: parts.molecular_function.clone(),
                systematic_name: parts.systematic_name.clone(),
                nutrient,
                rate,
                expression,
            });
        }
    }

    log::debug!(
        "Dropped {} missing expression values and {} values without a systematic name",
        dropped_missing,
        dropped_unnamed
    );

    Ok(LongTable { records })
}

/// Keep only (systematic name, nutrient) groups with exactly `expected` rows
pub fn filter_complete_groups(table: &LongTable, expected: usize) -> LongTable {
    let mut group_sizes: HashMap<(&str, Nutrient), usize> = HashMap::new();
    for record in &table.records {
        *group_sizes
            .entry((record.systematic_name.as_str(), record.nutrient))
            .or_insert(0) += 1;
    }

    let records: Vec<LongRecord> = table
        .records
        .iter()
        .filter(|r| group_sizes[&(r.systematic_name.as_str(), r.nutrient)] == expected)
        .cloned()
        .collect();

    let kept_groups = group_sizes.values().filter(|&&n| n == expected).count();
    info!(
        "Kept {} of {} gene/nutrient groups with exactly {} replicates",
        kept_groups,
        group_sizes.len(),
        expected
    );

    LongTable { records }
}

/// Load, clean and filter the expression table from a URL or path
pub fn load_long_table(source: &str, params: &LoadParams) -> Result<LongTable> {
    let text = read_text_input(source)?;
    let raw = read_raw_table(&text)?;
    info!("  {} rows, {} columns", raw.n_rows(), raw.header.len());

    let cleaned = clean_raw_table(&raw)?;
    let filtered = filter_complete_groups(&cleaned, params.expected_replicates);
    if filtered.is_empty() {
        return Err(LimmaError::EmptyData {
            reason: "No complete gene/nutrient groups remain after cleaning".to_string(),
        });
    }
    info!("  {} long-form records after cleaning", filtered.len());
    Ok(filtered)
}

impl LongTable {
    pub fn new(records: Vec<LongRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LongRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Row counts per (systematic name, nutrient) group
    pub fn group_sizes(&self) -> HashMap<(String, Nutrient), usize> {
        let mut sizes = HashMap::new();
        for record in &self.records {
            *sizes
                .entry((record.systematic_name.clone(), record.nutrient))
                .or_insert(0) += 1;
        }
        sizes
    }

    /// Records of one gene under one nutrient, in table order
    #[cfg(test)]
    pub fn gene_records<'a>(
        &'a self,
        systematic_name: &'a str,
        nutrient: Nutrient,
    ) -> impl Iterator<Item = &'a LongRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.systematic_name == systematic_name && r.nutrient == nutrient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATES: [&str; 6] = ["0.05", "0.1", "0.15", "0.2", "0.25", "0.3"];

    fn header() -> String {
        let mut cols = vec!["GID", "YORF", "NAME", "GWEIGHT"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        for code in ["G", "N"] {
            for rate in RATES {
                cols.push(format!("{}{}", code, rate));
            }
        }
        cols.join("\t")
    }

    fn row(name: &str, values: &[&str]) -> String {
        let mut fields = vec!["GENE".to_string(), "YORF".to_string(), name.to_string(), "1".to_string()];
        fields.extend(values.iter().map(|v| v.to_string()));
        fields.join("\t")
    }

    fn table_text(rows: &[String]) -> String {
        let mut text = header();
        text.push('\n');
        for r in rows {
            text.push_str(r);
            text.push('\n');
        }
        text
    }

    fn full_values() -> Vec<&'static str> {
        vec!["0.1", "0.2", "0.3", "0.4", "0.5", "0.6", "-0.1", "-0.2", "-0.3", "-0.4", "-0.5", "-0.6"]
    }

    #[test]
    fn test_clean_splits_name_and_pivots() {
        let text = table_text(&[row(
            "SFB2 || ER to Golgi transport || molecular function unknown || YNL049C || 1082129",
            &full_values(),
        )]);
        let raw = read_raw_table(&text).unwrap();
        let table = clean_raw_table(&raw).unwrap();

        assert_eq!(table.len(), 12);
        let first = &table.records()[0];
        assert_eq!(first.name, "SFB2");
        assert_eq!(first.biological_process, "ER to Golgi transport");
        assert_eq!(first.molecular_function, "molecular function unknown");
        assert_eq!(first.systematic_name, "YNL049C");
        assert_eq!(first.nutrient, Nutrient::Glucose);
        assert_eq!(first.rate, 0.05);
        assert_eq!(first.expression, 0.1);

        let last = &table.records()[11];
        assert_eq!(last.nutrient, Nutrient::Ammonia);
        assert_eq!(last.rate, 0.3);
        assert_eq!(last.expression, -0.6);
    }

    #[test]
    fn test_missing_values_and_names_dropped() {
        let mut values = full_values();
        values[0] = "";
        values[7] = "NA";
        let text = table_text(&[
            row("A || bp || mf || YAL001C || 1", &values),
            row(" || bp || mf ||  || 2", &full_values()),
        ]);
        let raw = read_raw_table(&text).unwrap();
        let table = clean_raw_table(&raw).unwrap();

        assert_eq!(table.len(), 10);
        assert!(table.records().iter().all(|r| r.systematic_name == "YAL001C"));
    }

    #[test]
    fn test_incomplete_groups_removed() {
        let mut values = full_values();
        values[0] = "";
        let text = table_text(&[
            row("A || bp || mf || YAL001C || 1", &values),
            row("B || bp || mf || YAL002W || 2", &full_values()),
        ]);
        let raw = read_raw_table(&text).unwrap();
        let cleaned = clean_raw_table(&raw).unwrap();
        let table = filter_complete_groups(&cleaned, 6);

        // YAL001C/Glucose has 5 rows and is dropped entirely
        assert_eq!(table.len(), 18);
        for ((gene, nutrient), n) in table.group_sizes() {
            assert_eq!(n, 6, "{} {} has {} rows", gene, nutrient, n);
        }
        assert_eq!(table.gene_records("YAL001C", Nutrient::Glucose).count(), 0);
        assert_eq!(table.gene_records("YAL001C", Nutrient::Ammonia).count(), 6);
    }

    #[test]
    fn test_duplicate_systematic_names_fail_group_filter() {
        let text = table_text(&[
            row("A || bp || mf || YAL001C || 1", &full_values()),
            row("A2 || bp || mf || YAL001C || 2", &full_values()),
        ]);
        let raw = read_raw_table(&text).unwrap();
        let table = filter_complete_groups(&clean_raw_table(&raw).unwrap(), 6);
        assert!(table.is_empty());
    }

    #[test]
    fn test_malformed_name_rejected() {
        let text = table_text(&[row("A || bp || YAL001C", &full_values())]);
        let raw = read_raw_table(&text).unwrap();
        assert!(matches!(
            clean_raw_table(&raw),
            Err(LimmaError::MalformedName { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_name_column_rejected() {
        let raw = read_raw_table("GID\tG0.05\nX\t1\n").unwrap();
        assert!(matches!(clean_raw_table(&raw), Err(LimmaError::InvalidSchema { .. })));
    }

    #[test]
    fn test_unknown_nutrient_code_rejected() {
        let raw = read_raw_table("NAME\tX0.05\na || b || c || Y1 || 1\t1\n").unwrap();
        assert!(matches!(clean_raw_table(&raw), Err(LimmaError::InvalidSchema { .. })));
    }
}
