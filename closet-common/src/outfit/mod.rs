//! Outfit matching
//!
//! Pure, synchronous computations over an in-memory snapshot of a user's
//! items. Nothing here performs I/O; randomness is injected through
//! [`PoolShuffle`] so callers decide between exploration and determinism.
//!
//! - [`compat`]: pairwise stylistic compatibility of a top and a bottom
//! - [`filter`]: season/formality matching and per-slot pool construction
//! - [`selector`]: anchored, tiered greedy selection of a four-slot outfit

pub mod compat;
pub mod filter;
pub mod selector;

pub use compat::compatible;
pub use filter::{
    filter_pool, fits_formality, fits_season, parse_formality_request, parse_season_request,
    SeasonRequest,
};
pub use selector::{
    suggest_outfit, wants_outerwear, NoShuffle, OutfitRequest, OutfitSuggestion, PoolShuffle,
    RngShuffle, Slot,
};
