//! SQL-style ranking window functions.
//!
//! Every function returns one value per input item, in input order. Items
//! whose ordering keys compare equal are peers.

use std::cmp::Ordering;

/// Peer-aware ranks of one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerRanks {
    /// `RANK()`, gaps after ties
    pub rank: usize,
    /// `DENSE_RANK()`, no gaps
    pub dense_rank: usize,
    /// `CUME_DIST()`: items ordered at or before this one's peers, over N
    pub cume_dist: f64,
    /// `PERCENT_RANK()`: `(rank - 1) / (N - 1)`, 0 for a single item
    pub percent_rank: f64,
}

/// Compare floats under the IEEE total order, so NaN never breaks a sort.
///
/// Signed zeros compare equal, as they do in SQL.
pub fn cmp_f64(a: f64, b: f64) -> Ordering {
    (a + 0.0).total_cmp(&(b + 0.0))
}

fn sorted_indices<T, F>(items: &[T], cmp: &F) -> Vec<usize>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| cmp(&items[a], &items[b]));
    order
}

/// `ROW_NUMBER()` under `cmp`. Ties keep input order.
pub fn row_numbers_by<T, F>(items: &[T], cmp: F) -> Vec<usize>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut numbers = vec![0; items.len()];
    for (position, index) in sorted_indices(items, &cmp).into_iter().enumerate() {
        numbers[index] = position + 1;
    }
    numbers
}

/// `RANK()`, `DENSE_RANK()`, `CUME_DIST()` and `PERCENT_RANK()` under `cmp`.
pub fn peer_ranks_by<T, F>(items: &[T], cmp: F) -> Vec<PeerRanks>
where
    F: Fn(&T, &T) -> Ordering,
{
    let n = items.len();
    let order = sorted_indices(items, &cmp);
    let mut ranks = vec![
        PeerRanks {
            rank: 0,
            dense_rank: 0,
            cume_dist: 0.0,
            percent_rank: 0.0,
        };
        n
    ];

    let mut start = 0;
    let mut dense = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && cmp(&items[order[start]], &items[order[end]]) == Ordering::Equal {
            end += 1;
        }

        dense += 1;
        let rank = start + 1;
        let cume_dist = end as f64 / n as f64;
        let percent_rank = if n > 1 {
            (rank - 1) as f64 / (n - 1) as f64
        } else {
            0.0
        };
        for &index in &order[start..end] {
            ranks[index] = PeerRanks {
                rank,
                dense_rank: dense,
                cume_dist,
                percent_rank,
            };
        }
        start = end;
    }

    ranks
}

/// `NTILE(buckets)` under `cmp`.
///
/// The first `N mod buckets` tiles receive one extra item.
pub fn ntile_by<T, F>(items: &[T], buckets: usize, cmp: F) -> Vec<usize>
where
    F: Fn(&T, &T) -> Ordering,
{
    let n = items.len();
    let buckets = buckets.max(1);
    let base = n / buckets;
    let extra = n % buckets;
    let large_span = extra * (base + 1);

    let mut tiles = vec![0; n];
    for (position, index) in sorted_indices(items, &cmp).into_iter().enumerate() {
        tiles[index] = if position < large_span {
            position / (base + 1) + 1
        } else {
            extra + (position - large_span) / base + 1
        };
    }
    tiles
}

/// `RANK()` by value descending.
pub fn rank_desc(values: &[f64]) -> Vec<usize> {
    peer_ranks_by(values, |a, b| cmp_f64(*b, *a))
        .into_iter()
        .map(|r| r.rank)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rank_and_dense_rank_with_ties() {
        let values = [10.0, 20.0, 20.0, 30.0];
        let ranks = peer_ranks_by(&values, |a, b| cmp_f64(*a, *b));

        let rank: Vec<usize> = ranks.iter().map(|r| r.rank).collect();
        let dense: Vec<usize> = ranks.iter().map(|r| r.dense_rank).collect();
        assert_eq!(rank, vec![1, 2, 2, 4]);
        assert_eq!(dense, vec![1, 2, 2, 3]);

        assert_relative_eq!(ranks[0].cume_dist, 0.25);
        assert_relative_eq!(ranks[1].cume_dist, 0.75);
        assert_relative_eq!(ranks[3].cume_dist, 1.0);
        assert_relative_eq!(ranks[1].percent_rank, 1.0 / 3.0);
        assert_relative_eq!(ranks[3].percent_rank, 1.0);
    }

    #[test]
    fn test_single_item() {
        let ranks = peer_ranks_by(&[5.0], |a, b| cmp_f64(*a, *b));
        assert_eq!(ranks[0].rank, 1);
        assert_eq!(ranks[0].percent_rank, 0.0);
        assert_eq!(ranks[0].cume_dist, 1.0);
    }

    #[test]
    fn test_rank_desc_input_order() {
        assert_eq!(rank_desc(&[10.0, 30.0, 20.0, 30.0]), vec![4, 1, 3, 1]);
        assert!(rank_desc(&[]).is_empty());
    }

    #[test]
    fn test_nan_keys_rank_without_panicking() {
        let values: Vec<f64> = (0..40)
            .map(|i| if i % 3 == 0 { f64::NAN } else { i as f64 })
            .collect();
        let ranks = rank_desc(&values);
        assert_eq!(ranks.len(), 40);
        // NaN orders above every number, so descending ranks put it first
        assert_eq!(ranks[0], 1);
        assert_eq!(ranks[39], 1);
        assert_eq!(ranks[38], 15);

        assert_eq!(cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn test_row_numbers() {
        let items = ["c", "a", "b"];
        assert_eq!(row_numbers_by(&items, |a, b| a.cmp(b)), vec![3, 1, 2]);
    }

    #[test]
    fn test_ntile_distributes_remainder_first() {
        let items: Vec<usize> = (0..10).collect();
        let tiles = ntile_by(&items, 4, |a, b| a.cmp(b));
        assert_eq!(tiles, vec![1, 1, 1, 2, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn test_ntile_fewer_items_than_tiles() {
        let items = [3, 1, 2];
        assert_eq!(ntile_by(&items, 10, |a, b| a.cmp(b)), vec![3, 1, 2]);
    }
}
