use docrev_core::error::DocrevError;
use docrev_core::session::{RoutingTable, DEFAULT_CLASSIFIER_PROFILE};

pub fn run() -> Result<(), DocrevError> {
    println!("Classifier profile: {DEFAULT_CLASSIFIER_PROFILE}");
    println!();
    println!("Label -> extraction profile:");
    for (label, profile) in RoutingTable::reference().entries() {
        println!("  {label:<22} -> {profile}");
    }
    Ok(())
}
