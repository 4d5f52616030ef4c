//! Gene annotation lookup built from the long table

use std::collections::BTreeMap;

use super::LongTable;

/// Annotation pair of a gene
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneAnnotation {
    pub biological_process: String,
    pub molecular_function: String,
}

/// Distinct mapping from systematic name to its annotation
#[derive(Debug, Clone, Default)]
pub struct GeneSetTable {
    genes: BTreeMap<String, GeneAnnotation>,
}

impl GeneSetTable {
    /// Collect the distinct annotations; the first record of a gene wins
    pub fn from_long(table: &LongTable) -> Self {
        let mut genes = BTreeMap::new();
        for record in table.records() {
            genes
                .entry(record.systematic_name.clone())
                .or_insert_with(|| GeneAnnotation {
                    biological_process: record.biological_process.clone(),
                    molecular_function: record.molecular_function.clone(),
                });
        }
        Self { genes }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, systematic_name: &str) -> Option<&GeneAnnotation> {
        self.genes.get(systematic_name)
    }

    /// Systematic names annotated with a biological process
    pub fn genes_in_process<'a>(&'a self, process: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.genes
            .iter()
            .filter(move |(_, a)| a.biological_process == process)
            .map(|(name, _)| name.as_str())
    }
}
