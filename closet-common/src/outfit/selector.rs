//! Outfit selection
//!
//! Builds one top/bottom/outer/shoes assignment from a user's items:
//! 1. Excluded items are dropped (exclusion beats anchoring)
//! 2. At most one anchor is honored per slot: the lowest item id wins
//! 3. Per-slot pools are filtered by season/formality, minus anchors
//! 4. Each pool is shuffled so "regenerate" can surface new combinations
//! 5. Top/bottom are resolved around anchors, preferring compatible pairs
//! 6. Outerwear is auto-picked only when the request calls for it
//! 7. Shoes are taken from the pool if not anchored
//!
//! Empty pools leave the slot empty; an empty suggestion is a valid answer.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::compat::compatible;
use super::filter::{filter_pool, SeasonRequest};
use crate::models::Item;
use crate::vocab::{Formality, OutfitPart, Season};

/// Ordering strategy applied to each candidate pool before the greedy scan
pub trait PoolShuffle {
    fn shuffle(&mut self, pool: &mut [Item]);
}

/// Uniform random permutation drawn from `R`
pub struct RngShuffle<R>(pub R);

impl<R: Rng> PoolShuffle for RngShuffle<R> {
    fn shuffle(&mut self, pool: &mut [Item]) {
        pool.shuffle(&mut self.0);
    }
}

/// Leaves pools in storage order (deterministic selection)
pub struct NoShuffle;

impl PoolShuffle for NoShuffle {
    fn shuffle(&mut self, _pool: &mut [Item]) {}
}

/// One of the four outfit roles the selector fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Top,
    Bottom,
    Outer,
    Shoes,
}

impl Slot {
    /// Outfit part that feeds this slot
    pub fn part(&self) -> OutfitPart {
        match self {
            Slot::Top => OutfitPart::Top,
            Slot::Bottom => OutfitPart::Bottom,
            Slot::Outer => OutfitPart::Outerwear,
            Slot::Shoes => OutfitPart::Shoes,
        }
    }

    pub fn all() -> &'static [Slot] {
        &[Slot::Top, Slot::Bottom, Slot::Outer, Slot::Shoes]
    }
}

/// Constraints for one suggestion
#[derive(Debug, Clone, Default)]
pub struct OutfitRequest {
    pub season: SeasonRequest,
    /// `None` means any formality
    pub formality: Option<Formality>,
    /// Items the caller insists on using
    pub anchor_ids: HashSet<i64>,
    /// Items that must not appear
    pub exclude_ids: HashSet<i64>,
}

/// Chosen item per slot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutfitSuggestion {
    pub top: Option<Item>,
    pub bottom: Option<Item>,
    pub outer: Option<Item>,
    pub shoes: Option<Item>,
}

impl OutfitSuggestion {
    pub fn get(&self, slot: Slot) -> Option<&Item> {
        match slot {
            Slot::Top => self.top.as_ref(),
            Slot::Bottom => self.bottom.as_ref(),
            Slot::Outer => self.outer.as_ref(),
            Slot::Shoes => self.shoes.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Slot::all().iter().all(|slot| self.get(*slot).is_none())
    }
}

/// Whether outerwear should be auto-picked for this request
pub fn wants_outerwear(season: Option<Season>, formality: Option<Formality>) -> bool {
    matches!(season, Some(Season::Winter | Season::Fall))
        || matches!(formality, Some(Formality::SemiFormal | Formality::Formal))
}

/// Suggest an outfit from `items`
///
/// Pure apart from the randomness consumed through `shuffler`.
pub fn suggest_outfit<S: PoolShuffle + ?Sized>(
    items: &[Item],
    request: &OutfitRequest,
    shuffler: &mut S,
) -> OutfitSuggestion {
    let mut anchors: Vec<&Item> = items
        .iter()
        .filter(|item| !request.exclude_ids.contains(&item.id))
        .filter(|item| request.anchor_ids.contains(&item.id))
        .collect();
    anchors.sort_by_key(|item| item.id);

    let anchor_for = |slot: Slot| {
        anchors
            .iter()
            .find(|item| item.outfit_part == Some(slot.part()))
            .map(|item| (*item).clone())
    };

    // anchors never come from the general pools, honored or not
    let skip_ids: HashSet<i64> = request
        .exclude_ids
        .union(&request.anchor_ids)
        .copied()
        .collect();

    let mut pool_for = |slot: Slot| {
        let mut pool = filter_pool(
            items,
            slot.part(),
            request.season,
            request.formality,
            &skip_ids,
        );
        shuffler.shuffle(&mut pool);
        pool
    };

    let tops = pool_for(Slot::Top);
    let bottoms = pool_for(Slot::Bottom);
    let outers = pool_for(Slot::Outer);
    let shoe_pool = pool_for(Slot::Shoes);

    debug!(
        tops = tops.len(),
        bottoms = bottoms.len(),
        outers = outers.len(),
        shoes = shoe_pool.len(),
        anchors = anchors.len(),
        "Built outfit pools"
    );

    let (top, bottom) = match (anchor_for(Slot::Top), anchor_for(Slot::Bottom)) {
        (Some(top), Some(bottom)) => (Some(top), Some(bottom)),
        (Some(top), None) => {
            let bottom = first_compatible(&bottoms, |candidate| compatible(&top, candidate));
            (Some(top), bottom)
        }
        (None, Some(bottom)) => {
            let top = first_compatible(&tops, |candidate| compatible(candidate, &bottom));
            (top, Some(bottom))
        }
        (None, None) => first_compatible_pair(&tops, &bottoms),
    };

    let mut outer = anchor_for(Slot::Outer);
    if outer.is_none() && wants_outerwear(request.season.season(), request.formality) {
        outer = outers.first().cloned();
    }

    let shoes = anchor_for(Slot::Shoes).or_else(|| shoe_pool.first().cloned());

    OutfitSuggestion {
        top,
        bottom,
        outer,
        shoes,
    }
}

/// First pool entry accepted by `fits`, else the first entry at all
fn first_compatible<F>(pool: &[Item], fits: F) -> Option<Item>
where
    F: Fn(&Item) -> bool,
{
    pool.iter()
        .find(|candidate| fits(*candidate))
        .or_else(|| pool.first())
        .cloned()
}

/// First compatible (top, bottom) in scan order, tops outermost
///
/// When no pair is compatible each slot independently falls back to the
/// first entry of its pool, which may clash.
fn first_compatible_pair(tops: &[Item], bottoms: &[Item]) -> (Option<Item>, Option<Item>) {
    for top in tops {
        if let Some(bottom) = bottoms.iter().find(|bottom| compatible(top, bottom)) {
            return (Some(top.clone()), Some(bottom.clone()));
        }
    }

    (tops.first().cloned(), bottoms.first().cloned())
}
