//! Reconciliation of quorum read responses
//!
//! A pure function over the *set* of responses: the winner is the maximum
//! under [`Versioned::cmp_priority`] (version, then raw value bytes), so
//! the outcome never depends on arrival order or on which replica index
//! answered.

use crate::common::ReplicaId;
use crate::protocol::Versioned;

/// Outcome of reconciling one read quorum.
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// The authoritative record. A tombstone or missing record here means
    /// the key is not found.
    pub winner: Versioned,
    /// Replicas whose version is strictly below the winner's; candidates
    /// for read-repair.
    pub stale: Vec<ReplicaId>,
}

/// Reconcile responses from distinct replicas. Returns `None` for an empty
/// input (the coordinator never produces one: R >= 1).
pub fn reconcile(responses: &[(ReplicaId, Versioned)]) -> Option<Reconciled> {
    let winner = responses
        .iter()
        .map(|(_, record)| record)
        .max_by(|a, b| a.cmp_priority(b))?
        .clone();

    let stale = responses
        .iter()
        .filter(|(_, record)| record.version < winner.version)
        .map(|(replica, _)| replica.clone())
        .collect();

    Some(Reconciled { winner, stale })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resp(replica: &str, record: Versioned) -> (ReplicaId, Versioned) {
        (replica.to_string(), record)
    }

    #[test]
    fn test_empty_input() {
        assert!(reconcile(&[]).is_none());
    }

    #[test]
    fn test_highest_version_wins() {
        let responses = vec![
            resp("a", Versioned::value(b"bar".as_ref(), 5)),
            resp("b", Versioned::value(b"baz".as_ref(), 7)),
        ];

        let outcome = reconcile(&responses).unwrap();
        assert_eq!(outcome.winner, Versioned::value(b"baz".as_ref(), 7));
        assert_eq!(outcome.stale, vec!["a".to_string()]);
    }

    #[test]
    fn test_version_tie_breaks_on_value_bytes() {
        let responses = vec![
            resp("a", Versioned::value(b"apple".as_ref(), 7)),
            resp("b", Versioned::value(b"zebra".as_ref(), 7)),
        ];

        let outcome = reconcile(&responses).unwrap();
        assert_eq!(outcome.winner.value.as_deref(), Some(b"zebra".as_ref()));
        // Same version is not stale, even when its value lost the tie
        assert!(outcome.stale.is_empty());
    }

    #[test]
    fn test_order_independence() {
        use rand::seq::SliceRandom;

        let mut responses = vec![
            resp("a", Versioned::value(b"v1".as_ref(), 3)),
            resp("b", Versioned::value(b"v2".as_ref(), 9)),
            resp("c", Versioned::tombstone(5)),
            resp("d", Versioned::missing()),
            resp("e", Versioned::value(b"v2-sibling".as_ref(), 9)),
        ];

        let baseline = reconcile(&responses).unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            responses.shuffle(&mut rng);
            let outcome = reconcile(&responses).unwrap();
            assert_eq!(outcome.winner, baseline.winner);

            let mut stale = outcome.stale;
            let mut expected = baseline.stale.clone();
            stale.sort();
            expected.sort();
            assert_eq!(stale, expected);
        }
    }

    #[test]
    fn test_all_tombstones() {
        let responses = vec![
            resp("a", Versioned::tombstone(4)),
            resp("b", Versioned::tombstone(6)),
            resp("c", Versioned::tombstone(6)),
        ];

        let outcome = reconcile(&responses).unwrap();
        assert!(outcome.winner.is_tombstone());
        assert_eq!(outcome.winner.version, 6);
        assert_eq!(outcome.stale, vec!["a".to_string()]);
    }

    #[test]
    fn test_all_missing() {
        let responses = vec![
            resp("a", Versioned::missing()),
            resp("b", Versioned::missing()),
        ];

        let outcome = reconcile(&responses).unwrap();
        assert!(outcome.winner.is_missing());
        assert!(outcome.stale.is_empty());
    }

    #[test]
    fn test_tombstone_beats_older_value() {
        let responses = vec![
            resp("a", Versioned::value(b"stale".as_ref(), 5)),
            resp("b", Versioned::tombstone(8)),
        ];

        let outcome = reconcile(&responses).unwrap();
        assert!(outcome.winner.is_tombstone());
        assert_eq!(outcome.stale, vec!["a".to_string()]);
    }

    #[test]
    fn test_missing_replica_is_repair_candidate() {
        let responses = vec![
            resp("a", Versioned::value(b"v".as_ref(), 5)),
            resp("b", Versioned::missing()),
        ];

        let outcome = reconcile(&responses).unwrap();
        assert_eq!(outcome.stale, vec!["b".to_string()]);
    }
}
