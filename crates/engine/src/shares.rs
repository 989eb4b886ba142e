//! Split engine.
//!
//! Turns a [`SplitRequest`] into one [`Share`] per participant. Equal shares
//! use plain `f64` division and are accepted as computed; explicit shares must
//! add up to exactly the expense amount. Either way the stored shares sum to
//! the amount within [`SPLIT_TOLERANCE`].

use std::collections::{BTreeMap, BTreeSet};

use crate::{EngineError, ResultEngine};

/// Largest distance between the sum of stored shares and the expense amount.
pub const SPLIT_TOLERANCE: f64 = 1e-6;

/// How an expense is divided among its participants.
#[derive(Clone, Debug, PartialEq)]
pub enum SplitRequest {
    /// Every listed user owes `amount / n`.
    EqualShare(Vec<i32>),
    /// Each user owes exactly the mapped amount.
    ExplicitShares(BTreeMap<i32, f64>),
}

/// One materialized obligation: `user_id` owes `amount_owed` for the expense.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Share {
    pub user_id: i32,
    pub amount_owed: f64,
}

pub(crate) fn validate_amount(amount: f64) -> ResultEngine<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

impl SplitRequest {
    /// Participant ids, without duplicates, in request order.
    pub fn participants(&self) -> Vec<i32> {
        match self {
            Self::EqualShare(ids) => {
                let mut seen = BTreeSet::new();
                ids.iter().copied().filter(|id| seen.insert(*id)).collect()
            }
            Self::ExplicitShares(amounts) => amounts.keys().copied().collect(),
        }
    }

    /// Materializes the shares of an expense of `amount` paid by `payer`.
    ///
    /// `personal` marks an expense with neither group nor thread: an equal
    /// split of such an expense must include the payer.
    pub fn shares(&self, amount: f64, payer: i32, personal: bool) -> ResultEngine<Vec<Share>> {
        validate_amount(amount)?;

        match self {
            Self::EqualShare(_) => {
                let participants = self.participants();
                if personal && !participants.contains(&payer) {
                    return Err(EngineError::PayerNotInSplit(format!(
                        "payer {payer} must be included in split_with"
                    )));
                }
                if participants.is_empty() {
                    return Err(EngineError::SplitMismatch(
                        "at least one participant is required".to_string(),
                    ));
                }

                let each = amount / participants.len() as f64;
                Ok(participants
                    .into_iter()
                    .map(|user_id| Share {
                        user_id,
                        amount_owed: each,
                    })
                    .collect())
            }
            Self::ExplicitShares(amounts) => {
                if amounts.is_empty() {
                    return Err(EngineError::SplitMismatch(
                        "at least one participant is required".to_string(),
                    ));
                }
                if let Some((user_id, _)) = amounts
                    .iter()
                    .find(|(_, owed)| !owed.is_finite() || **owed < 0.0)
                {
                    return Err(EngineError::InvalidAmount(format!(
                        "share of user {user_id} must be >= 0"
                    )));
                }

                let total: f64 = amounts.values().sum();
                if total != amount {
                    return Err(EngineError::SplitMismatch(format!(
                        "shares add up to {total}, expected {amount}"
                    )));
                }

                Ok(amounts
                    .iter()
                    .map(|(user_id, amount_owed)| Share {
                        user_id: *user_id,
                        amount_owed: *amount_owed,
                    })
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(shares: &[Share]) -> f64 {
        shares.iter().map(|s| s.amount_owed).sum()
    }

    #[test]
    fn equal_split_between_two() {
        let shares = SplitRequest::EqualShare(vec![1, 2])
            .shares(100.0, 1, false)
            .unwrap();
        assert_eq!(
            shares,
            vec![
                Share {
                    user_id: 1,
                    amount_owed: 50.0
                },
                Share {
                    user_id: 2,
                    amount_owed: 50.0
                },
            ]
        );
    }

    #[test]
    fn equal_split_keeps_real_division() {
        let shares = SplitRequest::EqualShare(vec![1, 2, 3])
            .shares(100.0, 1, true)
            .unwrap();
        assert!(shares.iter().all(|s| s.amount_owed == 100.0 / 3.0));
        assert!((total(&shares) - 100.0).abs() <= SPLIT_TOLERANCE);
    }

    #[test]
    fn equal_split_collapses_duplicates() {
        let shares = SplitRequest::EqualShare(vec![2, 1, 2])
            .shares(90.0, 1, true)
            .unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].user_id, 2);
        assert_eq!(shares[0].amount_owed, 45.0);
    }

    #[test]
    fn personal_equal_split_requires_payer() {
        let err = SplitRequest::EqualShare(vec![2, 3])
            .shares(30.0, 1, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::PayerNotInSplit(_)));
    }

    #[test]
    fn scoped_equal_split_allows_absent_payer() {
        let shares = SplitRequest::EqualShare(vec![2, 3])
            .shares(30.0, 1, false)
            .unwrap();
        assert_eq!(total(&shares), 30.0);
    }

    #[test]
    fn scoped_equal_split_without_participants() {
        let err = SplitRequest::EqualShare(vec![])
            .shares(30.0, 1, false)
            .unwrap_err();
        assert!(matches!(err, EngineError::SplitMismatch(_)));
    }

    #[test]
    #[should_panic(expected = "InvalidAmount(\"amount must be > 0\")")]
    fn zero_amount_is_rejected() {
        SplitRequest::EqualShare(vec![1])
            .shares(0.0, 1, true)
            .unwrap();
    }

    #[test]
    fn nan_amount_is_rejected() {
        let err = SplitRequest::EqualShare(vec![1])
            .shares(f64::NAN, 1, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn explicit_shares_must_match_total() {
        let amounts = BTreeMap::from([(1, 60.0), (2, 30.0)]);
        let err = SplitRequest::ExplicitShares(amounts)
            .shares(100.0, 1, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::SplitMismatch(_)));
    }

    #[test]
    fn explicit_shares_accept_exact_sum() {
        let amounts = BTreeMap::from([(1, 62.5), (2, 25.0), (3, 12.5)]);
        let shares = SplitRequest::ExplicitShares(amounts)
            .shares(100.0, 1, true)
            .unwrap();
        assert_eq!(shares.len(), 3);
        assert_eq!(total(&shares), 100.0);
    }

    #[test]
    fn explicit_shares_reject_sum_off_by_a_fraction() {
        let amounts = BTreeMap::from([(1, 50.0), (2, 50.000_000_5)]);
        let err = SplitRequest::ExplicitShares(amounts)
            .shares(100.0, 1, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::SplitMismatch(_)));
    }

    #[test]
    fn explicit_shares_do_not_require_payer() {
        let amounts = BTreeMap::from([(2, 25.0)]);
        let shares = SplitRequest::ExplicitShares(amounts)
            .shares(25.0, 1, true)
            .unwrap();
        assert_eq!(
            shares,
            vec![Share {
                user_id: 2,
                amount_owed: 25.0
            }]
        );
    }

    #[test]
    fn explicit_negative_share_is_rejected() {
        let amounts = BTreeMap::from([(1, 120.0), (2, -20.0)]);
        let err = SplitRequest::ExplicitShares(amounts)
            .shares(100.0, 1, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
