//! Ordered emission for a self-referencing store
//!
//! Taxa are emitted breadth-first from the roots, so every taxon follows its
//! parent and each batch can be inserted with foreign keys enforced. Synonyms
//! follow all taxa; they only depend on taxa, never on each other.

use super::filter::Forest;
use std::collections::{HashSet, VecDeque};
use std::slice::Chunks;
use ukbol_common::db::{SynonymRecord, TaxonNode};

/// Insertion plan for one generation
#[derive(Debug)]
pub struct EmissionPlan {
    taxa: Vec<TaxonNode>,
    synonyms: Vec<SynonymRecord>,
    batch_size: usize,
}

impl EmissionPlan {
    /// Order `forest` breadth-first and attach the resolved synonyms
    ///
    /// Synonyms whose taxon was not emitted are left out. A `batch_size` of
    /// zero is treated as one.
    pub fn new(forest: &Forest, synonyms: Vec<SynonymRecord>, batch_size: usize) -> Self {
        let mut emitted: HashSet<&str> = HashSet::with_capacity(forest.len());
        let mut taxa = Vec::with_capacity(forest.len());
        let mut queue: VecDeque<usize> = forest.roots().iter().copied().collect();

        while let Some(idx) = queue.pop_front() {
            let node = forest.node(idx);
            if !emitted.insert(node.id.as_str()) {
                continue;
            }
            taxa.push(node.clone());
            queue.extend(forest.children(idx).iter().copied());
        }

        let synonyms = synonyms
            .into_iter()
            .filter(|s| emitted.contains(s.accepted_taxon_id.as_str()))
            .collect();

        Self {
            taxa,
            synonyms,
            batch_size: batch_size.max(1),
        }
    }

    /// All taxa in emission order
    pub fn taxa(&self) -> &[TaxonNode] {
        &self.taxa
    }

    pub fn synonyms(&self) -> &[SynonymRecord] {
        &self.synonyms
    }

    pub fn taxon_batches(&self) -> Chunks<'_, TaxonNode> {
        self.taxa.chunks(self.batch_size)
    }

    pub fn synonym_batches(&self) -> Chunks<'_, SynonymRecord> {
        self.synonyms.chunks(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::FieldMapping;
    use crate::taxonomy::filter::apply_filter;
    use crate::taxonomy::graph::GraphBuilder;
    use std::collections::HashMap;
    use ukbol_common::config::TaxonomyConfig;

    fn plan(nodes: &[(&str, &str, &str, Option<&str>)], batch_size: usize) -> EmissionPlan {
        let mut builder = GraphBuilder::new(FieldMapping::dwca(), None);
        for (id, name, rank, parent) in nodes {
            builder.add_node(TaxonNode {
                id: id.to_string(),
                name: name.to_string(),
                authorship: None,
                rank: rank.to_string(),
                parent_id: parent.map(String::from),
            });
        }
        let (forest, _) = apply_filter(&builder.finish(), &TaxonomyConfig::default()).unwrap();
        EmissionPlan::new(&forest, Vec::new(), batch_size)
    }

    #[test]
    fn test_parents_before_children() {
        // Source order deliberately lists descendants first
        let plan = plan(
            &[
                ("s", "abrothallus cetrariae", "species", Some("g")),
                ("g", "abrothallus", "genus", Some("f")),
                ("f", "abrothallaceae", "family", Some("k")),
                ("p", "plantae", "kingdom", None),
                ("k", "fungi", "kingdom", None),
                ("g2", "other", "genus", Some("p")),
            ],
            2,
        );

        let position: HashMap<&str, usize> = plan
            .taxa()
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();
        for taxon in plan.taxa() {
            if let Some(parent) = &taxon.parent_id {
                assert!(position[parent.as_str()] < position[taxon.id.as_str()]);
            }
        }

        let ids: Vec<_> = plan.taxa().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["k", "p", "f", "g2", "g", "s"]);

        let sizes: Vec<_> = plan.taxon_batches().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![2, 2, 2]);
    }

    #[test]
    fn test_zero_batch_size() {
        let plan = plan(&[("k", "fungi", "kingdom", None)], 0);
        assert_eq!(plan.taxon_batches().count(), 1);
        assert_eq!(plan.synonym_batches().count(), 0);
    }
}
