//! Quickselect
//!
//! Finds the element of rank `k` in expected linear time by repeatedly
//! partitioning around a pivot. The slice is shuffled first so that already
//! ordered input does not degrade to quadratic time, and it is left
//! partitioned around the result:
//!
//! ```text
//! items[..k] <= items[k] <= items[k + 1..]
//! ```

use crate::{IndexError, Result};
use rand::seq::SliceRandom;
use std::cmp::Ordering;

/// Rearrange `items` so that `items[k]` holds the element of rank `k`
///
/// Destructive: the order of `items` afterwards is only partitioned, not sorted.
///
/// # Errors
/// `InvalidArgument` unless `k < items.len()`.
pub fn select<T: Ord>(items: &mut [T], k: usize) -> Result<&T> {
    if k >= items.len() {
        return Err(IndexError::InvalidArgument(format!(
            "rank {} is not between 0 and {}",
            k,
            items.len()
        )));
    }

    items.shuffle(&mut rand::thread_rng());

    let mut lo = 0;
    let mut hi = items.len() - 1;
    while hi > lo {
        let j = partition(items, lo, hi);
        match j.cmp(&k) {
            Ordering::Greater => hi = j - 1,
            Ordering::Less => lo = j + 1,
            Ordering::Equal => return Ok(&items[j]),
        }
    }
    Ok(&items[lo])
}

/// Partition `a[lo..=hi]` around `a[lo]` and return the pivot's final index `j`,
/// so that `a[lo..j] <= a[j] <= a[j + 1..=hi]`
fn partition<T: Ord>(a: &mut [T], lo: usize, hi: usize) -> usize {
    let mut i = lo;
    let mut j = hi + 1;

    loop {
        // find item on lo to swap
        i += 1;
        while a[i] < a[lo] {
            if i == hi {
                break;
            }
            i += 1;
        }

        // find item on hi to swap
        j -= 1;
        while a[lo] < a[j] {
            if j == lo {
                break;
            }
            j -= 1;
        }

        if i >= j {
            break;
        }
        a.swap(i, j);
    }

    a.swap(lo, j);
    j
}
