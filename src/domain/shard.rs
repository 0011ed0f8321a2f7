//! Shard partitioning.
//!
//! Splits the global shard range `[0, shard_count)` into contiguous groups
//! of at most `per_cluster` shards and names each group from a [`NamePool`].
//! Every shard id lands in exactly one group and ids keep their order.

use serde::Serialize;

use super::name::NamePool;
use crate::error::PlanError;

/// Gateway shard identifier.
pub type ShardId = u32;

/// One cluster's share of the shard range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub name: String,
    pub shard_ids: Vec<ShardId>,
}

/// The full partition of a fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShardPlan {
    pub shard_count: u32,
    pub per_cluster: usize,
    pub clusters: Vec<ClusterAssignment>,
}

/// Split `[0, shard_count)` into contiguous groups of at most `per_cluster`.
///
/// Only the last group may be shorter. Returns no groups when
/// `shard_count` or `per_cluster` is zero.
#[must_use]
pub fn partition(shard_count: u32, per_cluster: usize) -> Vec<Vec<ShardId>> {
    if per_cluster == 0 {
        return Vec::new();
    }
    let shards: Vec<ShardId> = (0..shard_count).collect();
    shards.chunks(per_cluster).map(<[ShardId]>::to_vec).collect()
}

impl ShardPlan {
    /// Partition `shard_count` shards and name each group from `names`.
    ///
    /// # Errors
    ///
    /// Fails when the shard count is zero or the pool runs out of names.
    pub fn build(
        shard_count: u32,
        per_cluster: usize,
        names: NamePool,
    ) -> Result<Self, PlanError> {
        if shard_count == 0 {
            return Err(PlanError::NoShards);
        }
        let groups = partition(shard_count, per_cluster);
        if groups.len() > names.remaining() {
            return Err(PlanError::NamePoolExhausted {
                needed: groups.len(),
                available: names.remaining(),
            });
        }

        let clusters = groups
            .into_iter()
            .zip(names)
            .map(|(shard_ids, name)| ClusterAssignment { name, shard_ids })
            .collect();

        Ok(Self {
            shard_count,
            per_cluster,
            clusters,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn partition_covers_range_exactly() {
        for n in 1..=40u32 {
            for k in 1..=6usize {
                let groups = partition(n, k);
                assert_eq!(groups.len(), (n as usize).div_ceil(k), "n={n} k={k}");
                assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= k));

                let flat: Vec<ShardId> = groups.iter().flatten().copied().collect();
                let expected: Vec<ShardId> = (0..n).collect();
                assert_eq!(flat, expected, "order or coverage broken for n={n} k={k}");

                let unique: BTreeSet<ShardId> = flat.iter().copied().collect();
                assert_eq!(unique.len(), n as usize);
            }
        }
    }

    #[test]
    fn last_group_may_be_short() {
        let groups = partition(10, 4);
        assert_eq!(groups, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn zero_group_size_yields_nothing() {
        assert!(partition(10, 0).is_empty());
    }

    #[test]
    fn plan_names_clusters_in_pool_order() {
        let plan = ShardPlan::build(9, 4, NamePool::default()).unwrap();
        let names: Vec<&str> = plan.clusters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Arbok", "Bulbasaur", "Charmander"]);
        assert_eq!(plan.clusters[2].shard_ids, vec![8]);
    }

    #[test]
    fn plan_rejects_zero_shards() {
        assert_eq!(
            ShardPlan::build(0, 4, NamePool::default()),
            Err(PlanError::NoShards)
        );
    }

    #[test]
    fn plan_rejects_exhausted_pool() {
        let pool = NamePool::new(vec!["A".into(), "B".into()]);
        assert_eq!(
            ShardPlan::build(9, 4, pool),
            Err(PlanError::NamePoolExhausted {
                needed: 3,
                available: 2
            })
        );
    }
}
