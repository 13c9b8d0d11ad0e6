//! Pure reconciliation planning.
//!
//! Given the set of ids present locally and the set present remotely, the
//! only derived decision is which local rows are orphaned (exist here, gone
//! there). Everything else in a pass is a blanket upsert, so no created/
//! updated classification is computed. No I/O happens here.

use std::collections::HashSet;

/// Ids of local rows with no remote counterpart, in ascending order.
///
/// Sorted so that delete logs and tests are deterministic. Duplicate local
/// ids are reported once.
#[must_use]
pub fn orphaned_ids(local: &[i64], remote: &[i64]) -> Vec<i64> {
    let remote: HashSet<i64> = remote.iter().copied().collect();
    let mut orphans: Vec<i64> = local
        .iter()
        .copied()
        .filter(|id| !remote.contains(id))
        .collect();
    orphans.sort_unstable();
    orphans.dedup();
    orphans
}
