//! Filters raw listings against a query, values the survivors and ranks them.

use tracing::debug;

use super::calculator::{self, Valuation};
use crate::error::RoiError;
use crate::models::{Query, RawListing, ScoredProperty};

/// How many listings each stage removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub price: usize,
    pub bedrooms: usize,
    pub undefined_roi: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub properties: Vec<ScoredProperty>,
    pub removed: FilterStats,
}

/// Pick the deposit boundary with the better ROI; ties go to the minimum deposit.
///
/// A boundary whose ROI is undefined is skipped, so only a listing with no
/// valid boundary is rejected.
pub fn best_valuation(listing: &RawListing, query: &Query) -> Result<Valuation, RoiError> {
    let range = query.deposit_range;
    let at_min = calculator::evaluate(listing, query, range.min);
    if range.min == range.max {
        return at_min;
    }
    let at_max = calculator::evaluate(listing, query, range.max);

    match (at_min, at_max) {
        (Ok(low), Ok(high)) => Ok(if high.roi > low.roi { high } else { low }),
        (Ok(low), Err(_)) => Ok(low),
        (Err(_), Ok(high)) => Ok(high),
        (Err(err), Err(_)) => Err(err),
    }
}

/// Rank `listings` best ROI first.
///
/// Ties on ROI are ordered by ascending price; ranks run 1..=N without gaps.
pub fn rank(query: &Query, listings: &[RawListing]) -> Ranking {
    let mut removed = FilterStats::default();
    let mut scored = Vec::with_capacity(listings.len());

    for listing in listings {
        if !query.price_range.contains(listing.price) {
            removed.price += 1;
            continue;
        }
        if !query.bedroom_range.contains(i64::from(listing.bedrooms)) {
            removed.bedrooms += 1;
            continue;
        }

        match best_valuation(listing, query) {
            Ok(valuation) => scored.push(ScoredProperty {
                listing: listing.clone(),
                estimated_rent: valuation.effective_rent,
                deposit: valuation.deposit,
                mortgage_monthly_payment: valuation.monthly_payment,
                roi: valuation.roi,
                rank: 0,
            }),
            Err(RoiError::UndefinedRoi) => {
                debug!(listing = %listing.id, "ROI undefined, excluding listing");
                removed.undefined_roi += 1;
            }
        }
    }

    scored.sort_by(|a, b| {
        b.roi
            .total_cmp(&a.roi)
            .then_with(|| a.listing.price.cmp(&b.listing.price))
    });
    for (i, property) in scored.iter_mut().enumerate() {
        property.rank = i + 1;
    }

    debug!(
        input = listings.len(),
        ranked = scored.len(),
        removed_price = removed.price,
        removed_bedrooms = removed.bedrooms,
        removed_undefined_roi = removed.undefined_roi,
        "ranked listings"
    );

    Ranking {
        properties: scored,
        removed,
    }
}
