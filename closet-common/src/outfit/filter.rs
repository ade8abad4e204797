//! Season and formality filtering
//!
//! A request of "any" places no constraint. Items lacking the attribute
//! always match: unclassified items are never penalized.

use std::collections::HashSet;

use tracing::warn;

use crate::models::Item;
use crate::vocab::{Formality, OutfitPart, Season};

/// Season constraint of an outfit request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonRequest {
    /// No constraint
    #[default]
    Any,
    Known(Season),
    /// A token outside the vocabulary; only season-less and `all_season`
    /// items satisfy it
    Unknown,
}

impl SeasonRequest {
    /// The requested season, when it is one of the vocabulary
    pub fn season(&self) -> Option<Season> {
        match self {
            SeasonRequest::Known(season) => Some(*season),
            SeasonRequest::Any | SeasonRequest::Unknown => None,
        }
    }

    /// Whether an item's season satisfies this request
    pub fn admits(&self, item: Option<Season>) -> bool {
        match self {
            SeasonRequest::Any => true,
            SeasonRequest::Known(season) => fits_season(item, Some(*season)),
            SeasonRequest::Unknown => matches!(item, None | Some(Season::AllSeason)),
        }
    }
}

impl From<Season> for SeasonRequest {
    fn from(season: Season) -> Self {
        SeasonRequest::Known(season)
    }
}

/// Whether an item's season satisfies the requested season
///
/// Matches when the request is any/`all_season`, the item has no season,
/// the seasons are equal, the item is `all_season`, or the item is a
/// compound season and the request is one of its two parts.
pub fn fits_season(item: Option<Season>, request: Option<Season>) -> bool {
    let (Some(item), Some(request)) = (item, request) else {
        return true;
    };

    if request == Season::AllSeason || item == Season::AllSeason || item == request {
        return true;
    }

    match item.parts() {
        Some((first, second)) => request == first || request == second,
        None => false,
    }
}

/// Whether an item's formality is within one level of the request
pub fn fits_formality(item: Option<Formality>, request: Option<Formality>) -> bool {
    let (Some(item), Some(request)) = (item, request) else {
        return true;
    };

    (item.rank() - request.rank()).abs() <= 1
}

/// Candidate items for one outfit part
///
/// Keeps items of `part` that fit the season and formality requests and
/// whose id is not in `skip_ids` (excluded or anchored items). Preserves
/// input order.
pub fn filter_pool(
    items: &[Item],
    part: OutfitPart,
    season: SeasonRequest,
    formality: Option<Formality>,
    skip_ids: &HashSet<i64>,
) -> Vec<Item> {
    items
        .iter()
        .filter(|item| item.outfit_part == Some(part))
        .filter(|item| !skip_ids.contains(&item.id))
        .filter(|item| season.admits(item.season))
        .filter(|item| fits_formality(item.formality, formality))
        .cloned()
        .collect()
}

fn constraint_token(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("any"))
}

/// Parse a season request parameter
///
/// Empty or "any" means no constraint; `all_season` is kept as-is and also
/// matches everything. Tokens outside the vocabulary become
/// [`SeasonRequest::Unknown`].
pub fn parse_season_request(raw: Option<&str>) -> SeasonRequest {
    match constraint_token(raw) {
        None => SeasonRequest::Any,
        Some(token) => match Season::parse(token) {
            Some(season) => SeasonRequest::Known(season),
            None => {
                warn!("Unknown season request '{}'", token);
                SeasonRequest::Unknown
            }
        },
    }
}

/// Parse a formality request parameter
///
/// Empty or "any" means no constraint. Unknown tokens rank lowest, as casual.
pub fn parse_formality_request(raw: Option<&str>) -> Option<Formality> {
    let token = constraint_token(raw)?;
    Some(Formality::parse(token).unwrap_or_else(|| {
        warn!("Unknown formality request '{}', treating as casual", token);
        Formality::Casual
    }))
}
