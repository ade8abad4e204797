//! Compatibility rules for a top/bottom pairing
//!
//! Rules are checked in order and the first violated rule makes the pair
//! incompatible:
//! 1. Formality gap: a casual top over a semi-formal or formal bottom
//! 2. Color clash: identical non-neutral primary colors (red on red)
//!
//! A rule whose inputs are missing on either side cannot be violated, so an
//! unclassified item never blocks a suggestion.

use crate::models::Item;
use crate::vocab::{is_neutral, Formality, DEFAULT_COLOR};

/// Whether `top` and `bottom` may be worn together
pub fn compatible(top: &Item, bottom: &Item) -> bool {
    !has_formality_gap(top, bottom) && !has_color_clash(top, bottom)
}

fn has_formality_gap(top: &Item, bottom: &Item) -> bool {
    matches!(
        (top.formality, bottom.formality),
        (
            Some(Formality::Casual),
            Some(Formality::SemiFormal | Formality::Formal)
        )
    )
}

fn has_color_clash(top: &Item, bottom: &Item) -> bool {
    let (Some(top_color), Some(bottom_color)) = (
        top.primary_color.as_deref(),
        bottom.primary_color.as_deref(),
    ) else {
        return false;
    };

    let top_color = top_color.trim().to_lowercase();
    let bottom_color = bottom_color.trim().to_lowercase();

    if top_color.is_empty() || bottom_color.is_empty() {
        return false;
    }
    // multicolor goes with anything
    if top_color == DEFAULT_COLOR || bottom_color == DEFAULT_COLOR {
        return false;
    }

    top_color == bottom_color && !is_neutral(&top_color)
}
