use alloy::primitives::U256;

/// Decimals of the native coin (wei -> ether)
pub const ETHER_DECIMALS: u8 = 18;

/// Whole ether amount expressed in wei
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(ETHER_DECIMALS))
}

/// Convert wei to ether (or native token with specified decimals)
pub fn wei_to_ether(wei: U256, decimals: u8) -> f64 {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = wei / divisor;
    let fraction = wei % divisor;

    // Convert to f64 (may lose precision for very large numbers)
    let whole_f64 = whole.to_string().parse::<f64>().unwrap_or(0.0);
    let fraction_f64 =
        fraction.to_string().parse::<f64>().unwrap_or(0.0) / (10_f64.powi(decimals as i32));

    whole_f64 + fraction_f64
}
