use rust_decimal_macros::dec;
use vatcalc::core::{BuyerProfile, CalculatorConfig, Location};
use vatcalc::rates::{RateResolver, RateTable, to_gross, to_net};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = CalculatorConfig::from_env().unwrap_or_else(|e| {
        eprintln!("ignoring configuration: {e}");
        CalculatorConfig::default().with_business_country_code("DE")
    });
    let resolver = RateResolver::new(RateTable::eu_standard())
        .with_business_country_code(config.business_country_code.as_deref());

    println!(
        "=== Net 100.00, seller in {} ===\n",
        resolver.business_country_code().unwrap_or("(unset)")
    );

    let buyers = [
        ("RO", None, BuyerProfile::CONSUMER),
        ("RO", None, BuyerProfile::COMPANY),
        ("DE", None, BuyerProfile::COMPANY),
        ("DE", Some("27498"), BuyerProfile::CONSUMER),
        ("ES", Some("35001"), BuyerProfile::CONSUMER),
        ("FR", Some("97400"), BuyerProfile::CONSUMER),
        ("CH", None, BuyerProfile::CONSUMER),
    ];

    for (country, postal, buyer) in buyers {
        let location = match postal {
            Some(pc) => Location::with_postal_code(country, pc),
            None => Location::new(country),
        };
        let Ok(location) = location else {
            println!("  {country}: invalid location");
            continue;
        };
        let resolution = resolver.resolve(&location, buyer);
        let result = to_gross(dec!(100), resolution.rate);
        println!(
            "  {country} {:<6} company={:<5} rate={:<6} tax={:>6} gross={:>7} ({:?})",
            postal.unwrap_or("-"),
            buyer.is_company,
            resolution.rate,
            result.tax_value,
            result.gross_price,
            resolution.source,
        );
    }

    println!("\n=== Gross 119.00 at 19 % ===\n");
    let back = to_net(dec!(119.00), dec!(0.19));
    println!("  net={} tax={}", back.net_price, back.tax_value);
}
