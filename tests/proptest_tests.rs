//! Property-based tests for rate resolution and price conversion.
//!
//! Run with: `cargo test --test proptest_tests`

use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use vatcalc::core::{BuyerProfile, Location};
use vatcalc::rates::*;

fn round2(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// Price from 0.00 to 99999.99.
fn arb_price() -> impl Strategy<Value = Decimal> {
    (0u64..10_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Rate in [0, 1) with up to four decimals.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0u32..10_000u32).prop_map(|r| Decimal::new(r as i64, 4))
}

/// Any representable Decimal, including values near `Decimal::MAX`.
fn arb_any_decimal() -> impl Strategy<Value = Decimal> {
    (any::<u32>(), any::<u32>(), any::<u32>(), any::<bool>(), 0u32..=28)
        .prop_map(|(lo, mid, hi, negative, scale)| Decimal::from_parts(lo, mid, hi, negative, scale))
}

/// Country code from the default table or outside it.
fn arb_country() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["RO", "DE", "AT", "ES", "FR", "IT", "CH", "US", "NO"])
}

proptest! {
    #[test]
    fn gross_follows_formula(net in arb_price(), rate in arb_rate()) {
        let r = to_gross(net, rate);
        prop_assert_eq!(r.tax_value, round2(rate * net));
        prop_assert_eq!(r.gross_price, round2(net + round2(rate * net)));
    }

    #[test]
    fn net_follows_formula(gross in arb_price(), rate in arb_rate()) {
        let r = to_net(gross, rate);
        let tax = if rate > Decimal::ZERO {
            round2(gross / (Decimal::ONE + rate) * rate)
        } else {
            Decimal::ZERO
        };
        prop_assert_eq!(r.tax_value, tax);
        prop_assert_eq!(r.net_price, round2(gross - tax));
    }

    #[test]
    fn conversion_never_panics(price in arb_any_decimal(), rate in arb_rate()) {
        let g = to_gross(price, rate);
        prop_assert_eq!(g.net_price, price);
        let n = to_net(price, rate);
        prop_assert_eq!(n.gross_price, price);
    }

    #[test]
    fn outputs_have_at_most_two_decimals(price in arb_price(), rate in arb_rate()) {
        let g = to_gross(price, rate);
        let n = to_net(price, rate);
        prop_assert!(g.tax_value.scale() <= 2);
        prop_assert!(g.gross_price.scale() <= 2);
        prop_assert!(n.tax_value.scale() <= 2);
        prop_assert!(n.net_price.scale() <= 2);
    }

    #[test]
    fn parts_add_up(price in arb_price(), rate in arb_rate()) {
        let g = to_gross(price, rate);
        prop_assert_eq!(g.net_price + g.tax_value, g.gross_price);
        let n = to_net(price, rate);
        prop_assert_eq!(n.net_price + n.tax_value, n.gross_price);
    }

    #[test]
    fn refunds_mirror_sales(price in arb_price(), rate in arb_rate()) {
        let sale = to_gross(price, rate);
        let refund = to_gross(-price, rate);
        prop_assert_eq!(refund.tax_value, -sale.tax_value);
        prop_assert_eq!(refund.gross_price, -sale.gross_price);
    }

    #[test]
    fn cross_border_company_always_zero(
        business in arb_country(),
        buyer in arb_country(),
    ) {
        prop_assume!(business != buyer);
        let resolver = RateResolver::new(RateTable::eu_standard())
            .with_business_country_code(Some(business));
        let loc = Location::new(buyer).unwrap();
        let r = resolver.resolve(&loc, BuyerProfile::COMPANY);
        prop_assert_eq!(r.rate, Decimal::ZERO);
        prop_assert_eq!(r.source, RateSource::ReverseCharge);
    }

    #[test]
    fn consumer_rate_ignores_business_country(
        business in arb_country(),
        buyer in arb_country(),
    ) {
        let table = RateTable::eu_standard();
        let expected = table.get(buyer).map_or(Decimal::ZERO, |e| e.rate);
        let resolver = RateResolver::new(table).with_business_country_code(Some(business));
        let loc = Location::new(buyer).unwrap();
        prop_assert_eq!(resolver.resolve_rate(&loc, BuyerProfile::CONSUMER), expected);
    }

    #[test]
    fn override_beats_country_rate(
        suffix in "[0-9]{0,3}",
        general in arb_rate(),
        special in arb_rate(),
    ) {
        let table = RateTable::new()
            .with_rate("PT", general).unwrap()
            .with_override("PT", "90", special).unwrap()
            .with_override("PT", "95", special).unwrap();
        let resolver = RateResolver::new(table);

        let inside = Location::with_postal_code("PT", &format!("90{suffix}")).unwrap();
        prop_assert_eq!(resolver.resolve_rate(&inside, BuyerProfile::CONSUMER), special);

        let outside = Location::with_postal_code("PT", &format!("10{suffix}")).unwrap();
        prop_assert_eq!(resolver.resolve_rate(&outside, BuyerProfile::CONSUMER), general);
    }
}
