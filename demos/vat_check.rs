use vatcalc::core::CalculatorConfig;
use vatcalc::registry::{ValidationClient, ValidationOutcome, ViesConnector};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // The VIES test service answers 100 with valid and 200 with invalid
    let config = CalculatorConfig::default().with_sandbox(true);
    let client = ValidationClient::new(ViesConnector::new(), &config);

    println!("=== VIES check ({:?}) ===\n", client.endpoint());

    for id in ["DE100", "DE200", "12"] {
        match client.validate(id) {
            Ok(ValidationOutcome::Checked(r)) => println!(
                "  {id} => valid={}, name={}",
                r.valid,
                r.name.as_deref().unwrap_or("-")
            ),
            Ok(ValidationOutcome::Unverifiable) => println!("  {id} => could not verify"),
            Err(e) => println!("  {id} => error: {e}"),
        }
    }

    println!("\n  client status: {:?}", client.status());
}
