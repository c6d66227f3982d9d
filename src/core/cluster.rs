//! Cluster bookkeeping for particles that have stuck together.
//!
//! Every particle carries exactly one cluster label, so membership is an
//! equivalence relation by construction: two particles are in the same cluster
//! iff their labels are equal. Merging relabels one whole class; dissolving
//! gives a particle a fresh label nobody else holds.

#![warn(missing_docs)]

use std::collections::BTreeMap;

/// Mapping from particle index to cluster label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSet {
    labels: Vec<usize>,
    next_label: usize,
}

impl ClusterSet {
    /// `n` singleton clusters.
    pub fn new(n: usize) -> Self {
        Self {
            labels: (0..n).collect(),
            next_label: n,
        }
    }

    /// Number of particles tracked.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when tracking no particles.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Cluster label of particle `i`. Labels are opaque; only equality is meaningful.
    #[inline]
    pub fn cluster_of(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// Whether particles `i` and `j` carry the same cluster label.
    #[inline]
    pub fn same_cluster(&self, i: usize, j: usize) -> bool {
        self.labels[i] == self.labels[j]
    }

    /// Union of the clusters holding `i` and `j`.
    ///
    /// Returns `false` when they already share a cluster.
    pub fn merge(&mut self, i: usize, j: usize) -> bool {
        let (keep, drop) = (self.labels[i], self.labels[j]);
        if keep == drop {
            return false;
        }
        for l in self.labels.iter_mut().filter(|l| **l == drop) {
            *l = keep;
        }
        true
    }

    /// Detach particle `i` into a singleton cluster. The rest of its former
    /// cluster stays together.
    pub fn dissolve(&mut self, i: usize) {
        if self.is_singleton(i) {
            return;
        }
        self.labels[i] = self.next_label;
        self.next_label += 1;
    }

    /// True when particle `i` has no cluster partner.
    pub fn is_singleton(&self, i: usize) -> bool {
        let label = self.labels[i];
        self.labels.iter().filter(|&&l| l == label).count() == 1
    }

    /// Members of the cluster containing `i`, in ascending index order.
    pub fn members(&self, i: usize) -> Vec<usize> {
        let label = self.labels[i];
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(k, _)| k)
            .collect()
    }

    /// All clusters, each sorted, ordered by their smallest member.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (k, &l) in self.labels.iter().enumerate() {
            by_label.entry(l).or_default().push(k);
        }
        let mut groups: Vec<Vec<usize>> = by_label.into_values().collect();
        groups.sort_by_key(|g| g[0]);
        groups
    }

    /// Number of clusters with more than one member.
    pub fn num_multi(&self) -> usize {
        self.groups().iter().filter(|g| g.len() > 1).count()
    }
}
