//! Taxonomy graph construction
//!
//! Nodes live in an arena indexed by position; edges are parent→child index
//! lists. Records may name a parent that appears later in the feed (or never),
//! so nodes are collected first and linked in a second pass by [`GraphBuilder::finish`].

use crate::sources::FieldMapping;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use ukbol_common::db::{SynonymRecord, TaxonNode};
use ukbol_common::fields::{field, Case, RawRecord};

/// Counters collected while building the graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Raw records seen
    pub records: u64,
    /// Accepted taxa registered as nodes
    pub taxa: u64,
    /// Synonym records buffered
    pub synonyms: u64,
    /// Records missing an identity field (skipped)
    pub malformed: u64,
    /// Records from another info source (skipped)
    pub foreign: u64,
    /// Taxa or synonyms whose ID was already registered (later copies skipped)
    pub duplicates: u64,
    /// Parent references that did not resolve and were nulled
    pub dangling_parents: u64,
    /// Parent→child edges created
    pub edges: u64,
}

/// Result of classifying one raw record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Taxon(TaxonNode),
    Synonym(SynonymRecord),
    Malformed,
    Foreign,
}

/// Accepted taxa with their parent→child edges, plus the buffered synonyms
#[derive(Debug, Default)]
pub struct TaxonGraph {
    nodes: Vec<TaxonNode>,
    index: HashMap<String, usize>,
    children: Vec<Vec<usize>>,
    synonyms: Vec<SynonymRecord>,
    stats: BuildStats,
}

impl TaxonGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: usize) -> &TaxonNode {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[TaxonNode] {
        &self.nodes
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Arena index of a node's parent (`None` for parentless nodes)
    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.nodes[idx]
            .parent_id
            .as_deref()
            .and_then(|id| self.index_of(id))
    }

    /// Children in source order
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn synonyms(&self) -> &[SynonymRecord] {
        &self.synonyms
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }
}

/// Incremental graph builder fed one raw record at a time
pub struct GraphBuilder {
    mapping: FieldMapping,
    info_source: Option<String>,
    synonym_ids: HashSet<String>,
    graph: TaxonGraph,
}

impl GraphBuilder {
    /// `info_source`: when set and the mapping has an info source field,
    /// records naming a different source, or none at all, are skipped
    pub fn new(mapping: FieldMapping, info_source: Option<String>) -> Self {
        Self {
            mapping,
            info_source,
            synonym_ids: HashSet::new(),
            graph: TaxonGraph::default(),
        }
    }

    /// Decide what a raw record represents and normalize its fields
    pub fn classify(&self, record: &RawRecord) -> Classified {
        if let (Some(column), Some(expected)) = (self.mapping.info_source, &self.info_source) {
            if field(record, column, Case::Lower).as_ref() != Some(expected) {
                return Classified::Foreign;
            }
        }

        let (Some(id), Some(name), Some(rank)) = (
            field(record, self.mapping.id, Case::Keep),
            field(record, self.mapping.name, Case::Lower),
            field(record, self.mapping.rank, Case::Lower),
        ) else {
            return Classified::Malformed;
        };
        let authorship = field(record, self.mapping.authorship, Case::Keep);

        let is_synonym = field(record, self.mapping.status, Case::Lower)
            .is_some_and(|status| status.contains("synonym"));

        if is_synonym {
            return match field(record, self.mapping.accepted_id, Case::Keep) {
                Some(accepted_taxon_id) => Classified::Synonym(SynonymRecord {
                    id,
                    name,
                    authorship,
                    rank,
                    accepted_taxon_id,
                }),
                None => Classified::Malformed,
            };
        }

        let parent_id = field(record, self.mapping.parent_id, Case::Keep);
        Classified::Taxon(TaxonNode {
            id,
            name,
            authorship,
            rank,
            parent_id,
        })
    }

    /// Register one raw record
    pub fn push(&mut self, record: &RawRecord) {
        self.graph.stats.records += 1;

        match self.classify(record) {
            Classified::Taxon(node) => self.add_node(node),
            Classified::Synonym(synonym) => self.add_synonym(synonym),
            Classified::Malformed => {
                self.graph.stats.malformed += 1;
                debug!(?record, "Skipping malformed record");
            }
            Classified::Foreign => self.graph.stats.foreign += 1,
        }
    }

    /// Register an already-normalized node
    pub fn add_node(&mut self, node: TaxonNode) {
        if self.graph.index.contains_key(&node.id) {
            self.graph.stats.duplicates += 1;
            debug!(id = %node.id, "Skipping duplicate taxon");
            return;
        }
        self.graph.stats.taxa += 1;
        self.graph.index.insert(node.id.clone(), self.graph.nodes.len());
        self.graph.nodes.push(node);
    }

    /// Buffer a synonym; later records reusing its ID are skipped
    pub fn add_synonym(&mut self, synonym: SynonymRecord) {
        if !self.synonym_ids.insert(synonym.id.clone()) {
            self.graph.stats.duplicates += 1;
            debug!(id = %synonym.id, "Skipping duplicate synonym");
            return;
        }
        self.graph.stats.synonyms += 1;
        self.graph.synonyms.push(synonym);
    }

    /// Link children to parents; unresolvable parent references are nulled
    pub fn finish(self) -> TaxonGraph {
        let mut graph = self.graph;
        graph.children = vec![Vec::new(); graph.nodes.len()];

        for idx in 0..graph.nodes.len() {
            let Some(parent_id) = graph.nodes[idx].parent_id.as_deref() else {
                continue;
            };
            // A self reference can never be satisfied by the store either
            match graph.index.get(parent_id).copied() {
                Some(parent) if parent != idx => {
                    graph.children[parent].push(idx);
                    graph.stats.edges += 1;
                }
                _ => {
                    debug!(id = %graph.nodes[idx].id, parent_id, "Nulling unresolved parent reference");
                    graph.nodes[idx].parent_id = None;
                    graph.stats.dangling_parents += 1;
                }
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn nbn_builder() -> GraphBuilder {
        GraphBuilder::new(FieldMapping::nbn(), Some("uksi".to_string()))
    }

    fn accepted(id: &str, name: &str, rank: &str, parent: &str) -> RawRecord {
        record(&[
            ("guid", id),
            ("scientificName", name),
            ("rank", rank),
            ("taxonomicStatus", "accepted"),
            ("parentGuid", parent),
            ("infoSourceName", "UKSI"),
        ])
    }

    #[test]
    fn test_classify_normalizes_taxon() {
        let builder = nbn_builder();
        let mut row = accepted("NHMSYS01", "  Fungi ", "Kingdom", "None");
        row.insert("scientificNameAuthorship".to_string(), "R.T. Moore".to_string());

        match builder.classify(&row) {
            Classified::Taxon(node) => {
                assert_eq!(node.id, "NHMSYS01");
                assert_eq!(node.name, "fungi");
                assert_eq!(node.rank, "kingdom");
                assert_eq!(node.authorship.as_deref(), Some("R.T. Moore"));
                assert_eq!(node.parent_id, None);
            }
            other => panic!("Expected taxon, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_synonym() {
        let builder = nbn_builder();
        let row = record(&[
            ("guid", "s1"),
            ("scientificName", "Old Name"),
            ("rank", "species"),
            ("taxonomicStatus", "heterotypicSynonym"),
            ("acceptedConceptID", "t1"),
            ("infoSourceName", "UKSI"),
        ]);
        match builder.classify(&row) {
            Classified::Synonym(synonym) => {
                assert_eq!(synonym.name, "old name");
                assert_eq!(synonym.accepted_taxon_id, "t1");
            }
            other => panic!("Expected synonym, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_rejects_incomplete_rows() {
        let builder = nbn_builder();
        let no_rank = record(&[("guid", "t1"), ("scientificName", "x"), ("infoSourceName", "uksi")]);
        assert_eq!(builder.classify(&no_rank), Classified::Malformed);

        let orphan_synonym = record(&[
            ("guid", "s1"),
            ("scientificName", "x"),
            ("rank", "species"),
            ("taxonomicStatus", "synonym"),
            ("infoSourceName", "uksi"),
        ]);
        assert_eq!(builder.classify(&orphan_synonym), Classified::Malformed);
    }

    #[test]
    fn test_classify_other_info_source() {
        let builder = nbn_builder();
        let mut row = accepted("t1", "x", "genus", "");
        row.insert("infoSourceName".to_string(), "Other List".to_string());
        assert_eq!(builder.classify(&row), Classified::Foreign);

        // A record that does not name its source is not from the expected one
        row.remove("infoSourceName");
        assert_eq!(builder.classify(&row), Classified::Foreign);
        row.insert("infoSourceName".to_string(), "  ".to_string());
        assert_eq!(builder.classify(&row), Classified::Foreign);

        // Mappings without the field are not filtered
        let dwca = GraphBuilder::new(FieldMapping::dwca(), Some("uksi".to_string()));
        let row = record(&[
            ("taxonID", "t1"),
            ("scientificName", "x"),
            ("taxonRank", "genus"),
            ("taxonomicStatus", "accepted"),
        ]);
        assert!(matches!(dwca.classify(&row), Classified::Taxon(_)));
    }

    #[test]
    fn test_duplicate_synonym_skipped() {
        let mut builder = nbn_builder();
        let synonym = |name: &str, accepted: &str| {
            record(&[
                ("guid", "s1"),
                ("scientificName", name),
                ("rank", "species"),
                ("taxonomicStatus", "synonym"),
                ("acceptedConceptID", accepted),
                ("infoSourceName", "uksi"),
            ])
        };
        builder.push(&accepted("t1", "first", "genus", ""));
        builder.push(&synonym("old name", "t1"));
        builder.push(&synonym("older name", "t1"));
        let graph = builder.finish();

        assert_eq!(graph.synonyms().len(), 1);
        assert_eq!(graph.synonyms()[0].name, "old name");
        assert_eq!(graph.stats().synonyms, 1);
        assert_eq!(graph.stats().duplicates, 1);
    }

    #[test]
    fn test_forward_references_link() {
        let mut builder = nbn_builder();
        // child appears before its parent
        builder.push(&accepted("g1", "abrothallus", "genus", "k1"));
        builder.push(&accepted("k1", "fungi", "kingdom", ""));
        builder.push(&accepted("x1", "lost", "genus", "missing"));
        builder.push(&accepted("k1", "fungi again", "kingdom", ""));
        let graph = builder.finish();

        assert_eq!(graph.len(), 3);
        let k1 = graph.index_of("k1").unwrap();
        let g1 = graph.index_of("g1").unwrap();
        let x1 = graph.index_of("x1").unwrap();
        assert_eq!(graph.children(k1), &[g1]);
        assert_eq!(graph.parent_of(g1), Some(k1));
        assert_eq!(graph.node(x1).parent_id, None);
        assert_eq!(graph.node(k1).name, "fungi");

        let stats = graph.stats();
        assert_eq!(stats.records, 4);
        assert_eq!(stats.edges, 1);
        assert_eq!(stats.dangling_parents, 1);
        assert_eq!(stats.duplicates, 1);
    }

    #[test]
    fn test_self_parent_is_nulled() {
        let mut builder = nbn_builder();
        builder.push(&accepted("t1", "loop", "genus", "t1"));
        let graph = builder.finish();
        assert_eq!(graph.node(0).parent_id, None);
        assert!(graph.children(0).is_empty());
        assert_eq!(graph.stats().dangling_parents, 1);
    }
}
