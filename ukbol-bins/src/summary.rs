//! Per-cluster summaries of a taxon's associated specimens

use crate::matcher::specimens_in_clusters_of;
use crate::MatchContext;
use futures::TryStreamExt;
use serde::Serialize;
use std::collections::HashMap;
use std::pin::pin;
use ukbol_common::db::{SpecimenRecord, TaxonNode};
use ukbol_common::Result;

/// How often one identification occurs within a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: u64,
}

/// Summary of one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    pub cluster_id: String,
    /// All specimens in the cluster, identified or not
    pub total: u64,
    /// Specimens collected in the configured geography
    pub in_geography: u64,
    /// Identifications, most frequent first; ties keep first-seen order
    pub names: Vec<NameCount>,
}

/// Summarize the taxon's associated specimens, largest cluster first
///
/// Clusters of equal size are ordered by cluster ID.
pub async fn summarize(ctx: &MatchContext, taxon: &TaxonNode) -> Result<Vec<ClusterSummary>> {
    let associated = specimens_in_clusters_of(ctx, taxon).await?;
    let mut builder = SummaryBuilder::new(&ctx.config().geography);

    let mut specimens = pin!(associated.stream());
    while let Some(specimen) = specimens.try_next().await? {
        builder.push(&specimen);
    }
    Ok(builder.finish())
}

/// Summarize specimens that are already grouped by cluster
///
/// Specimens without a cluster ID are ignored.
pub fn summarize_specimens<'a>(
    specimens: impl IntoIterator<Item = &'a SpecimenRecord>,
    geography: &str,
) -> Vec<ClusterSummary> {
    let mut builder = SummaryBuilder::new(geography);
    for specimen in specimens {
        builder.push(specimen);
    }
    builder.finish()
}

/// Folds a cluster-grouped specimen sequence into summaries, one run at a time
#[derive(Debug)]
pub struct SummaryBuilder {
    geography: String,
    current: Option<Group>,
    finished: Vec<ClusterSummary>,
}

impl SummaryBuilder {
    pub fn new(geography: &str) -> Self {
        Self {
            geography: geography.to_string(),
            current: None,
            finished: Vec::new(),
        }
    }

    pub fn push(&mut self, specimen: &SpecimenRecord) {
        let Some(cluster_id) = specimen.cluster_id.as_deref() else {
            return;
        };

        let same_run = self
            .current
            .as_ref()
            .is_some_and(|group| group.cluster_id == cluster_id);
        if !same_run {
            if let Some(done) = self.current.replace(Group::new(cluster_id)) {
                self.finished.push(done.finish());
            }
        }

        if let Some(group) = self.current.as_mut() {
            group.add(specimen, &self.geography);
        }
    }

    pub fn finish(mut self) -> Vec<ClusterSummary> {
        if let Some(done) = self.current.take() {
            self.finished.push(done.finish());
        }
        self.finished.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.cluster_id.cmp(&b.cluster_id))
        });
        self.finished
    }
}

#[derive(Debug)]
struct Group {
    cluster_id: String,
    total: u64,
    in_geography: u64,
    names: Vec<NameCount>,
    positions: HashMap<String, usize>,
}

impl Group {
    fn new(cluster_id: &str) -> Self {
        Self {
            cluster_id: cluster_id.to_string(),
            total: 0,
            in_geography: 0,
            names: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn add(&mut self, specimen: &SpecimenRecord, geography: &str) {
        self.total += 1;
        if specimen
            .country_iso
            .as_deref()
            .is_some_and(|country| country.eq_ignore_ascii_case(geography))
        {
            self.in_geography += 1;
        }

        if let Some(name) = specimen.identification.as_deref() {
            match self.positions.get(name) {
                Some(&pos) => self.names[pos].count += 1,
                None => {
                    self.positions.insert(name.to_string(), self.names.len());
                    self.names.push(NameCount {
                        name: name.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    fn finish(mut self) -> ClusterSummary {
        // Stable sort, so equal counts stay in first-seen order
        self.names.sort_by(|a, b| b.count.cmp(&a.count));
        ClusterSummary {
            cluster_id: self.cluster_id,
            total: self.total,
            in_geography: self.in_geography,
            names: self.names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specimen(cluster: Option<&str>, name: Option<&str>, country: Option<&str>) -> SpecimenRecord {
        SpecimenRecord {
            cluster_id: cluster.map(String::from),
            identification: name.map(String::from),
            country_iso: country.map(String::from),
            ..Default::default()
        }
    }

    fn names(summary: &ClusterSummary) -> Vec<(&str, u64)> {
        summary
            .names
            .iter()
            .map(|n| (n.name.as_str(), n.count))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(summarize_specimens(&[], "gb").is_empty());
    }

    #[test]
    fn test_name_table_order() {
        let specimens = vec![
            specimen(Some("BOLD:A"), Some("vespa velutina"), None),
            specimen(Some("BOLD:A"), Some("vespa crabro"), None),
            specimen(Some("BOLD:A"), Some("vespa crabro"), None),
            specimen(Some("BOLD:A"), Some("vespa simillima"), None),
            specimen(Some("BOLD:A"), Some("vespa velutina"), None),
            specimen(Some("BOLD:A"), Some("vespula vulgaris"), None),
        ];
        let summaries = summarize_specimens(&specimens, "gb");
        assert_eq!(summaries.len(), 1);
        assert_eq!(
            names(&summaries[0]),
            vec![
                ("vespa velutina", 2),
                ("vespa crabro", 2),
                ("vespa simillima", 1),
                ("vespula vulgaris", 1),
            ]
        );
    }

    #[test]
    fn test_groups_ordered_by_total() {
        let specimens = vec![
            specimen(Some("BOLD:A"), Some("a"), Some("gb")),
            specimen(Some("BOLD:B"), Some("b"), Some("GB")),
            specimen(Some("BOLD:B"), Some("b"), Some("fr")),
            specimen(Some("BOLD:C"), Some("c"), None),
            specimen(Some("BOLD:D"), Some("d"), None),
            specimen(Some("BOLD:D"), None, Some("gb")),
        ];
        let summaries = summarize_specimens(&specimens, "gb");

        let order: Vec<_> = summaries.iter().map(|s| s.cluster_id.as_str()).collect();
        assert_eq!(order, vec!["BOLD:B", "BOLD:D", "BOLD:A", "BOLD:C"]);

        let b = &summaries[0];
        assert_eq!(b.total, 2);
        assert_eq!(b.in_geography, 1);

        // Unidentified specimens count towards the total only
        let d = &summaries[1];
        assert_eq!(d.total, 2);
        assert_eq!(d.in_geography, 1);
        assert_eq!(names(d), vec![("d", 1)]);
    }

    #[test]
    fn test_geography_case_insensitive() {
        let specimens = vec![
            specimen(Some("BOLD:A"), Some("a"), Some("GB")),
            specimen(Some("BOLD:A"), Some("a"), Some("gb")),
            specimen(Some("BOLD:A"), Some("a"), Some("ie")),
        ];
        let summaries = summarize_specimens(&specimens, "Gb");
        assert_eq!(summaries[0].in_geography, 2);
    }

    #[test]
    fn test_specimens_without_cluster_ignored() {
        let specimens = vec![
            specimen(None, Some("a"), Some("gb")),
            specimen(Some("BOLD:A"), Some("a"), Some("gb")),
        ];
        let summaries = summarize_specimens(&specimens, "gb");
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].total, 1);
    }
}
