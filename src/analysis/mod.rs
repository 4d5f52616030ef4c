//! Downstream analysis of tidy model output
//!
//! Keys are split back into systematic name and nutrient, p-values are adjusted
//! per (term, nutrient) facet, and the table is filtered and joined back to the
//! cleaned long data for charting.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::data::{split_key, GeneSetTable, LongRecord, LongTable, Nutrient};
use crate::error::Result;
use crate::lm::INTERCEPT;
use crate::testing::AdjustMethod;
use crate::tidy::TidyRow;

/// A tidy row with its key split and an adjusted p-value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneTermResult {
    pub systematic_name: String,
    pub nutrient: Nutrient,
    pub term: String,
    pub estimate: f64,
    #[serde(rename = "std.error")]
    pub std_error: f64,
    pub statistic: f64,
    #[serde(rename = "p.value")]
    pub p_value: f64,
    /// NaN until [`adjust_by_group`] has run
    #[serde(rename = "p.adjusted")]
    pub p_adjusted: f64,
}

/// Split every row key into `(systematic_name, nutrient)`.
///
/// Fails on the first key that does not split.
pub fn separate(rows: &[TidyRow]) -> Result<Vec<GeneTermResult>> {
    rows.iter()
        .map(|row| {
            let (systematic_name, nutrient) = split_key(&row.gene)?;
            Ok(GeneTermResult {
                systematic_name,
                nutrient,
                term: row.term.clone(),
                estimate: row.estimate,
                std_error: row.std_error,
                statistic: row.statistic,
                p_value: row.p_value,
                p_adjusted: f64::NAN,
            })
        })
        .collect()
}

/// Fill `p_adjusted` independently within each (term, nutrient) group
pub fn adjust_by_group(rows: &mut [GeneTermResult], method: AdjustMethod) {
    let mut groups: HashMap<(String, Nutrient), Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        groups
            .entry((row.term.clone(), row.nutrient))
            .or_default()
            .push(i);
    }

    for indices in groups.values() {
        let pvalues: Vec<f64> = indices.iter().map(|&i| rows[i].p_value).collect();
        for (&i, padj) in indices.iter().zip(method.adjust(&pvalues)) {
            rows[i].p_adjusted = padj;
        }
    }
}

/// Rows of `term` grouped by nutrient, preserving input order within a group
fn by_nutrient<'a>(
    rows: &'a [GeneTermResult],
    term: &'a str,
) -> BTreeMap<Nutrient, Vec<&'a GeneTermResult>> {
    let mut groups: BTreeMap<Nutrient, Vec<&GeneTermResult>> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.term == term) {
        groups.entry(row.nutrient).or_default().push(row);
    }
    groups
}

/// The `n` rows of `term` with the largest absolute estimate in each nutrient.
///
/// The sort is stable, so tied estimates keep their input order; NaN estimates
/// rank last. Output is ordered by nutrient, then rank.
pub fn top_by_effect(rows: &[GeneTermResult], term: &str, n: usize) -> Vec<GeneTermResult> {
    let magnitude = |r: &GeneTermResult| {
        if r.estimate.is_nan() {
            f64::NEG_INFINITY
        } else {
            r.estimate.abs()
        }
    };

    let mut top = Vec::new();
    for (_, mut group) in by_nutrient(rows, term) {
        group.sort_by(|a, b| magnitude(*b).total_cmp(&magnitude(*a)));
        top.extend(group.into_iter().take(n).cloned());
    }
    top
}

/// Rows of `term` whose adjusted p-value is below `alpha`
pub fn significant(rows: &[GeneTermResult], term: &str, alpha: f64) -> Vec<GeneTermResult> {
    rows.iter()
        .filter(|r| r.term == term && r.p_adjusted < alpha)
        .cloned()
        .collect()
}

/// Intercept rows of the genes annotated with a biological process
pub fn intercepts_for_process(
    rows: &[GeneTermResult],
    genes: &GeneSetTable,
    process: &str,
) -> Vec<GeneTermResult> {
    let members: HashSet<&str> = genes.genes_in_process(process).collect();
    rows.iter()
        .filter(|r| r.term == INTERCEPT && members.contains(r.systematic_name.as_str()))
        .cloned()
        .collect()
}

/// One observed expression value of an analysed gene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub systematic_name: String,
    pub name: String,
    pub nutrient: Nutrient,
    pub term: String,
    pub estimate: f64,
    pub rate: f64,
    pub expression: f64,
}

/// Inner join of analysed rows to the long table on (systematic_name, nutrient).
///
/// Each row expands to one point per observed rate; rows with no matching
/// observations are dropped.
pub fn join_trends(rows: &[GeneTermResult], long: &LongTable) -> Vec<TrendPoint> {
    let mut index: HashMap<(&str, Nutrient), Vec<&LongRecord>> = HashMap::new();
    for record in long.records() {
        index
            .entry((record.systematic_name.as_str(), record.nutrient))
            .or_default()
            .push(record);
    }

    let mut points = Vec::new();
    for row in rows {
        let Some(records) = index.get(&(row.systematic_name.as_str(), row.nutrient)) else {
            continue;
        };
        for record in records {
            points.push(TrendPoint {
                systematic_name: row.systematic_name.clone(),
                name: record.name.clone(),
                nutrient: row.nutrient,
                term: row.term.clone(),
                estimate: row.estimate,
                rate: record.rate,
                expression: record.expression,
            });
        }
    }
    points
}

/// Tested and significant counts for one term
#[derive(Debug, Clone, PartialEq)]
pub struct TermSummary {
    pub term: String,
    pub tested: usize,
    pub significant: usize,
}

/// Per-term counts of an analysed table
#[derive(Debug, Clone)]
pub struct ResultsSummary {
    pub total_rows: usize,
    pub terms: Vec<TermSummary>,
    pub alpha: f64,
}

impl ResultsSummary {
    pub fn new(rows: &[GeneTermResult], alpha: f64) -> Self {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for row in rows {
            let entry = counts.entry(row.term.as_str()).or_default();
            if row.p_value.is_finite() {
                entry.0 += 1;
            }
            if row.p_adjusted < alpha {
                entry.1 += 1;
            }
        }

        ResultsSummary {
            total_rows: rows.len(),
            terms: counts
                .into_iter()
                .map(|(term, (tested, significant))| TermSummary {
                    term: term.to_string(),
                    tested,
                    significant,
                })
                .collect(),
            alpha,
        }
    }
}

impl fmt::Display for ResultsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Growth Rate Model Summary")?;
        writeln!(f, "=========================")?;
        writeln!(f, "Gene-condition-term rows: {}", self.total_rows)?;
        for term in &self.terms {
            writeln!(
                f,
                "{}: {} tested, {} significant (padj < {})",
                term.term, term.tested, term.significant, self.alpha
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LimmaError;
    use crate::lm::RATE;
    use crate::testing::benjamini_hochberg;

    fn result(sys: &str, nutrient: Nutrient, term: &str, estimate: f64, p: f64) -> GeneTermResult {
        GeneTermResult {
            systematic_name: sys.to_string(),
            nutrient,
            term: term.to_string(),
            estimate,
            std_error: 0.1,
            statistic: estimate / 0.1,
            p_value: p,
            p_adjusted: f64::NAN,
        }
    }

    fn record(sys: &str, bp: &str, nutrient: Nutrient, rate: f64, expression: f64) -> LongRecord {
        LongRecord {
            name: format!("{}-name", sys),
            biological_process: bp.to_string(),
            molecular_function: "unknown".to_string(),
            systematic_name: sys.to_string(),
            nutrient,
            rate,
            expression,
        }
    }

    #[test]
    fn test_separate_splits_keys() {
        let rows = vec![TidyRow {
            gene: "YAL_001C_Leucine".to_string(),
            term: RATE.to_string(),
            estimate: 2.0,
            std_error: 0.5,
            statistic: 4.0,
            p_value: 0.01,
        }];
        let out = separate(&rows).unwrap();
        assert_eq!(out[0].systematic_name, "YAL_001C");
        assert_eq!(out[0].nutrient, Nutrient::Leucine);
        assert_eq!(out[0].estimate, 2.0);
        assert!(out[0].p_adjusted.is_nan());
    }

    #[test]
    fn test_separate_rejects_bad_key() {
        let rows = vec![TidyRow {
            gene: "YAL001C-Leucine".to_string(),
            term: RATE.to_string(),
            estimate: 0.0,
            std_error: 1.0,
            statistic: 0.0,
            p_value: 1.0,
        }];
        assert!(matches!(
            separate(&rows),
            Err(LimmaError::InvalidKey { .. }) | Err(LimmaError::UnknownNutrient { .. })
        ));
    }

    #[test]
    fn test_adjust_by_group_is_independent_per_facet() {
        let mut rows = vec![
            result("A", Nutrient::Glucose, RATE, 1.0, 0.01),
            result("B", Nutrient::Glucose, RATE, 1.0, 0.04),
            result("A", Nutrient::Leucine, RATE, 1.0, 0.01),
            result("B", Nutrient::Glucose, INTERCEPT, 1.0, 0.03),
            result("C", Nutrient::Glucose, RATE, 1.0, 0.02),
        ];
        adjust_by_group(&mut rows, AdjustMethod::Fdr);

        let glucose = benjamini_hochberg(&[0.01, 0.04, 0.02]);
        assert!((rows[0].p_adjusted - glucose[0]).abs() < 1e-12);
        assert!((rows[1].p_adjusted - glucose[1]).abs() < 1e-12);
        assert!((rows[4].p_adjusted - glucose[2]).abs() < 1e-12);
        // singleton groups are unadjusted
        assert_eq!(rows[2].p_adjusted, 0.01);
        assert_eq!(rows[3].p_adjusted, 0.03);
    }

    #[test]
    fn test_adjusted_monotone_within_group() {
        let ps = [0.3, 0.001, 0.04, 0.02, 0.9, 0.04, 0.6];
        let mut rows: Vec<GeneTermResult> = ps
            .iter()
            .enumerate()
            .map(|(i, &p)| result(&format!("Y{}", i), Nutrient::Sulfate, RATE, 1.0, p))
            .collect();
        adjust_by_group(&mut rows, AdjustMethod::Fdr);
        for a in &rows {
            for b in &rows {
                if a.p_value <= b.p_value {
                    assert!(a.p_adjusted <= b.p_adjusted);
                }
            }
        }
    }

    #[test]
    fn test_top_by_effect_bounds_and_order() {
        let mut rows = Vec::new();
        for (i, est) in [0.5, -3.0, 1.0, 2.0, -0.1].iter().enumerate() {
            rows.push(result(&format!("G{}", i), Nutrient::Glucose, RATE, *est, 0.5));
        }
        rows.push(result("L0", Nutrient::Leucine, RATE, 9.0, 0.5));
        rows.push(result("G9", Nutrient::Glucose, INTERCEPT, 100.0, 0.5));

        let top = top_by_effect(&rows, RATE, 3);
        let names: Vec<&str> = top.iter().map(|r| r.systematic_name.as_str()).collect();
        // glucose first (nutrient order), then leucine with its single row
        assert_eq!(names, vec!["G1", "G3", "G2", "L0"]);
        assert!(top.iter().all(|r| r.term == RATE));

        assert!(top_by_effect(&rows, RATE, 0).is_empty());
        assert_eq!(top_by_effect(&rows, RATE, 50).len(), 6);
    }

    #[test]
    fn test_top_by_effect_ties_keep_input_order() {
        let rows = vec![
            result("A", Nutrient::Uracil, RATE, 1.0, 0.5),
            result("B", Nutrient::Uracil, RATE, -1.0, 0.5),
            result("C", Nutrient::Uracil, RATE, 1.0, 0.5),
            result("D", Nutrient::Uracil, RATE, f64::NAN, 0.5),
        ];
        let top = top_by_effect(&rows, RATE, 2);
        assert_eq!(top[0].systematic_name, "A");
        assert_eq!(top[1].systematic_name, "B");

        let all = top_by_effect(&rows, RATE, 4);
        assert_eq!(all[3].systematic_name, "D");
    }

    #[test]
    fn test_significant() {
        let mut rows = vec![
            result("A", Nutrient::Glucose, RATE, 1.0, 0.001),
            result("B", Nutrient::Glucose, RATE, 1.0, 0.9),
            result("C", Nutrient::Glucose, INTERCEPT, 1.0, 0.001),
        ];
        adjust_by_group(&mut rows, AdjustMethod::Fdr);
        let hits = significant(&rows, RATE, 0.05);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].systematic_name, "A");
    }

    #[test]
    fn test_join_trends() {
        let long = LongTable::new(vec![
            record("A", "p", Nutrient::Glucose, 0.05, 1.0),
            record("A", "p", Nutrient::Glucose, 0.1, 1.5),
            record("A", "p", Nutrient::Leucine, 0.05, -1.0),
            record("B", "p", Nutrient::Glucose, 0.05, 0.2),
        ]);
        let rows = vec![
            result("A", Nutrient::Glucose, RATE, 10.0, 0.01),
            result("Z", Nutrient::Glucose, RATE, 1.0, 0.01),
        ];
        let points = join_trends(&rows, &long);
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.systematic_name == "A" && p.nutrient == Nutrient::Glucose));
        assert_eq!(points[1].rate, 0.1);
        assert_eq!(points[1].expression, 1.5);
        assert_eq!(points[0].name, "A-name");
    }

    #[test]
    fn test_intercepts_for_process() {
        let long = LongTable::new(vec![
            record("A", "leucine biosynthesis", Nutrient::Glucose, 0.05, 1.0),
            record("B", "other", Nutrient::Glucose, 0.05, 1.0),
        ]);
        let genes = GeneSetTable::from_long(&long);
        let rows = vec![
            result("A", Nutrient::Glucose, INTERCEPT, 0.3, 0.1),
            result("A", Nutrient::Glucose, RATE, 0.3, 0.1),
            result("B", Nutrient::Glucose, INTERCEPT, 0.3, 0.1),
        ];
        let hits = intercepts_for_process(&rows, &genes, "leucine biosynthesis");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].systematic_name, "A");
        assert_eq!(hits[0].term, INTERCEPT);
    }

    #[test]
    fn test_summary_counts() {
        let mut rows = vec![
            result("A", Nutrient::Glucose, RATE, 1.0, 0.001),
            result("B", Nutrient::Glucose, RATE, 1.0, f64::NAN),
            result("A", Nutrient::Glucose, INTERCEPT, 1.0, 0.5),
        ];
        adjust_by_group(&mut rows, AdjustMethod::Fdr);
        let summary = ResultsSummary::new(&rows, 0.05);
        assert_eq!(summary.total_rows, 3);
        let rate = summary.terms.iter().find(|t| t.term == RATE).unwrap();
        assert_eq!((rate.tested, rate.significant), (1, 1));
        let intercept = summary.terms.iter().find(|t| t.term == INTERCEPT).unwrap();
        assert_eq!((intercept.tested, intercept.significant), (1, 0));
        assert!(summary.to_string().contains("rate: 1 tested"));
    }
}
