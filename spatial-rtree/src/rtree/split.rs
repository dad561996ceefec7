//! Quadratic node splitting.
//!
//! Partitions the `M + 1` items of an overflowing node into two groups, each
//! holding at least `min_fill` items. Works the same for leaf entries and for
//! child references through the [`Bounded`] trait.

use crate::bounding_box::BoundingBox;

use super::rtree_types::Bounded;

/// One output group of a split, with its MBR.
#[derive(Debug)]
pub struct SplitGroup<E> {
    pub items: Vec<E>,
    pub mbr: BoundingBox,
}

impl<E: Bounded> SplitGroup<E> {
    fn seeded(seed: E) -> Self {
        let mbr = *seed.bbox();
        Self { items: vec![seed], mbr }
    }

    fn push(&mut self, item: E) {
        self.mbr.expand(item.bbox());
        self.items.push(item);
    }

    fn absorb(&mut self, rest: Vec<E>) {
        for item in rest {
            self.push(item);
        }
    }
}

/// Splits `items` into two groups using Guttman's quadratic algorithm.
///
/// Requires `items.len() >= 2 * min_fill + 1` and `min_fill >= 1`, which the
/// tree guarantees by only splitting nodes holding exactly `M + 1` items with
/// `M >= 2m`. Every item lands in exactly one group and each group ends with
/// at least `min_fill` items. Ties are broken by position so the result is
/// deterministic.
pub fn quadratic_split<E: Bounded>(
    mut items: Vec<E>,
    min_fill: usize,
) -> (SplitGroup<E>, SplitGroup<E>) {
    debug_assert!(items.len() >= 2, "split needs at least two items");

    let (first_idx, second_idx) = pick_seeds(&items);

    // second_idx > first_idx, so removing it first keeps first_idx stable
    let second_seed = items.remove(second_idx);
    let first_seed = items.remove(first_idx);

    let mut first = SplitGroup::seeded(first_seed);
    let mut second = SplitGroup::seeded(second_seed);

    while !items.is_empty() {
        if first.items.len() + items.len() <= min_fill {
            first.absorb(std::mem::take(&mut items));
            break;
        }
        if second.items.len() + items.len() <= min_fill {
            second.absorb(std::mem::take(&mut items));
            break;
        }

        let next = pick_next(&items, &first.mbr, &second.mbr);
        let item = items.remove(next);

        if prefers_first(item.bbox(), &first, &second) {
            first.push(item);
        } else {
            second.push(item);
        }
    }

    (first, second)
}

/// Picks the pair whose covering box wastes the most area.
fn pick_seeds<E: Bounded>(items: &[E]) -> (usize, usize) {
    let mut best = (0, 1);
    let mut max_waste = f64::NEG_INFINITY;

    for (i, a) in items.iter().enumerate() {
        for (j, b) in items.iter().enumerate().skip(i + 1) {
            let waste = a.bbox().union(b.bbox()).area() - a.bbox().area() - b.bbox().area();
            if waste > max_waste {
                max_waste = waste;
                best = (i, j);
            }
        }
    }

    best
}

/// Picks the item with the strongest preference for one group over the other.
fn pick_next<E: Bounded>(
    items: &[E],
    first_mbr: &BoundingBox,
    second_mbr: &BoundingBox,
) -> usize {
    let mut best_idx = 0;
    let mut max_difference = f64::NEG_INFINITY;

    for (i, item) in items.iter().enumerate() {
        let d1 = first_mbr.enlargement(item.bbox());
        let d2 = second_mbr.enlargement(item.bbox());
        let difference = (d1 - d2).abs();

        if difference > max_difference {
            max_difference = difference;
            best_idx = i;
        }
    }

    best_idx
}

/// Lower enlargement wins, then smaller resulting area, then the first group.
fn prefers_first<E: Bounded>(
    bbox: &BoundingBox,
    first: &SplitGroup<E>,
    second: &SplitGroup<E>,
) -> bool {
    let d1 = first.mbr.enlargement(bbox);
    let d2 = second.mbr.enlargement(bbox);

    if d1 != d2 {
        return d1 < d2;
    }

    let area1 = first.mbr.union(bbox).area();
    let area2 = second.mbr.union(bbox).area();
    area1 <= area2
}
