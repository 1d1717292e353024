//! Mortgage and rental-yield arithmetic for a single listing.
//!
//! Everything here is pure: the same listing, query and deposit always give
//! the same [`Valuation`].

use crate::error::RoiError;
use crate::models::{Query, RawListing};

/// Result of valuing one listing at one deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub deposit: i64,
    pub effective_rent: f64,
    pub loan_amount: f64,
    pub monthly_payment: f64,
    pub annual_net_cashflow: f64,
    pub roi: f64,
}

/// Monthly rent after the query's rent adjustments, never negative.
pub fn effective_rent(base_rent: f64, query: &Query) -> f64 {
    (base_rent + query.rent_increase as f64 - query.rent_deduction as f64).max(0.0)
}

/// Purchase price adjusted for renovation cost deltas, never negative.
pub fn effective_price_basis(price: i64, query: &Query) -> f64 {
    (price as f64 + query.investment_increase as f64 - query.investment_deduction as f64).max(0.0)
}

/// Standard annuity payment for an amortizing loan.
///
/// `annual_rate_pct` is a percentage (5.5 means 5.5%), `years` the term.
pub fn monthly_payment(loan_amount: f64, annual_rate_pct: f64, years: i64) -> f64 {
    if loan_amount <= 0.0 || years <= 0 {
        return 0.0;
    }

    let r = annual_rate_pct / 100.0 / 12.0;
    let n = years as f64 * 12.0;

    // 1 - (1 + r)^-n, kept accurate for rates close to zero
    let discount = -(-n * r.ln_1p()).exp_m1();
    if r > 0.0 && discount > 0.0 && discount.is_finite() {
        loan_amount * r / discount
    } else {
        loan_amount / n
    }
}

/// Value `listing` under `query` with `deposit` paid upfront.
pub fn evaluate(listing: &RawListing, query: &Query, deposit: i64) -> Result<Valuation, RoiError> {
    let rent = effective_rent(listing.base_rent, query);
    let basis = effective_price_basis(listing.price, query);
    let loan_amount = (basis - deposit as f64).max(0.0);
    let payment = monthly_payment(loan_amount, query.mortgage_interest_rate, query.mortgage_length);
    let annual_net_cashflow = rent * 12.0 - payment * 12.0;

    if deposit <= 0 {
        return Err(RoiError::UndefinedRoi);
    }

    Ok(Valuation {
        deposit,
        effective_rent: rent,
        loan_amount,
        monthly_payment: payment,
        annual_net_cashflow,
        roi: annual_net_cashflow / deposit as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{listing, sample_query};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_reference_payment_at_minimum_deposit() {
        let query = sample_query();
        let home = listing("1", 200_000, 2, 1_200.0);

        let valuation = evaluate(&home, &query, 10_000).unwrap();

        assert!(close(valuation.loan_amount, 190_000.0));
        assert!((valuation.monthly_payment - 2_061.999_281).abs() < 1e-3);
        assert!((valuation.roi - -1.034_399_137).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rate_spreads_principal_evenly() {
        assert!(close(monthly_payment(120_000.0, 0.0, 10), 1_000.0));
    }

    #[test]
    fn test_tiny_rate_stays_finite() {
        let payment = monthly_payment(190_000.0, 1e-14, 10);
        assert!((payment - 190_000.0 / 120.0).abs() < 1e-6);

        let query = sample_query();
        let mut near_zero = query.clone();
        near_zero.mortgage_interest_rate = 1e-12;
        let valuation = evaluate(&listing("1", 200_000, 2, 1_200.0), &near_zero, 10_000).unwrap();
        assert!(valuation.roi.is_finite());
    }

    #[test]
    fn test_long_term_does_not_overflow() {
        let payment = monthly_payment(190_000.0, 5.5, i64::MAX);
        assert!(payment.is_finite());
        assert!(payment > 0.0);
    }

    #[test]
    fn test_no_loan_means_no_payment() {
        assert_eq!(monthly_payment(0.0, 5.0, 25), 0.0);
        assert_eq!(monthly_payment(-50.0, 5.0, 25), 0.0);
    }

    #[test]
    fn test_deposit_above_price_floors_loan() {
        let query = sample_query();
        let home = listing("1", 20_000, 1, 500.0);

        let valuation = evaluate(&home, &query, 30_000).unwrap();
        assert_eq!(valuation.loan_amount, 0.0);
        assert_eq!(valuation.monthly_payment, 0.0);
        assert!(close(valuation.roi, 6_000.0 / 30_000.0));
    }

    #[test]
    fn test_adjustments_apply_and_floor_at_zero() {
        let mut query = sample_query();
        query.rent_increase = 100;
        query.rent_deduction = 50;
        assert!(close(effective_rent(1_000.0, &query), 1_050.0));

        query.rent_deduction = 5_000;
        assert_eq!(effective_rent(1_000.0, &query), 0.0);

        query.investment_increase = 15_000;
        query.investment_deduction = 5_000;
        assert!(close(effective_price_basis(200_000, &query), 210_000.0));

        query.investment_deduction = 1_000_000;
        assert_eq!(effective_price_basis(200_000, &query), 0.0);
    }

    #[test]
    fn test_zero_deposit_is_undefined() {
        let query = sample_query();
        let home = listing("1", 200_000, 2, 1_200.0);
        assert_eq!(evaluate(&home, &query, 0), Err(RoiError::UndefinedRoi));
    }
}
