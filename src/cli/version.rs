/// Display version information
pub fn execute() {
    println!("cohort {}", env!("CARGO_PKG_VERSION"));
    println!("Threshold-gated collective accounts");
}
