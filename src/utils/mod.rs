pub mod candle;
pub mod constants;
pub mod engine_config;
pub mod env;
pub mod geo;

/// Rounds `value` to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
