//! Plans the writes that turn a stored collection into a desired one.

use std::collections::{BTreeSet, HashSet};

use crate::error::{ComputeError, Result};

/// Writes needed to replace a collection with the desired list.
///
/// Indexes refer to positions in the desired list, so callers can keep the
/// list order as the stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// `(existing id, desired index)`
    pub updates: Vec<(i32, usize)>,
    pub inserts: Vec<usize>,
    /// Ids in ascending order
    pub deletes: Vec<i32>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Compares stored ids against the ids of the desired items.
///
/// Desired items without an id, or with an id that is not stored, are
/// inserted. Stored ids missing from the desired list are deleted.
pub fn plan_reconciliation(existing: &[i32], desired: &[Option<i32>]) -> Result<ReconcilePlan> {
    let stored: HashSet<i32> = existing.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut plan = ReconcilePlan::default();

    for (index, id) in desired.iter().enumerate() {
        match id {
            Some(id) => {
                if !seen.insert(*id) {
                    return Err(ComputeError::DuplicateItem(*id));
                }
                if stored.contains(id) {
                    plan.updates.push((*id, index));
                } else {
                    plan.inserts.push(index);
                }
            }
            None => plan.inserts.push(index),
        }
    }

    let deletes: BTreeSet<i32> = stored.difference(&seen).copied().collect();
    plan.deletes = deletes.into_iter().collect();
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_updates_inserts_and_deletes() {
        let plan = plan_reconciliation(&[1, 2, 3, 4], &[Some(3), None, Some(1), Some(99)]).unwrap();

        assert_eq!(plan.updates, vec![(3, 0), (1, 2)]);
        assert_eq!(plan.inserts, vec![1, 3]);
        assert_eq!(plan.deletes, vec![2, 4]);
    }

    #[test]
    fn empty_desired_list_deletes_everything() {
        let plan = plan_reconciliation(&[5, 2], &[]).unwrap();
        assert_eq!(plan.deletes, vec![2, 5]);
        assert!(plan.updates.is_empty());
        assert!(plan.inserts.is_empty());
    }

    #[test]
    fn identical_lists_only_update() {
        let plan = plan_reconciliation(&[1, 2], &[Some(1), Some(2)]).unwrap();
        assert_eq!(plan.updates.len(), 2);
        assert!(plan.deletes.is_empty());
        assert!(!plan.is_empty());
        assert!(plan_reconciliation(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = plan_reconciliation(&[1], &[Some(1), Some(1)]).unwrap_err();
        assert!(matches!(err, ComputeError::DuplicateItem(1)));
    }
}
