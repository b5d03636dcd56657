use crate::model::UsageSummary;
use std::env;

pub const PRICE_PER_1K_INPUT_VAR: &str = "DOCREV_PRICE_PER_1K_INPUT";
pub const PRICE_PER_1K_OUTPUT_VAR: &str = "DOCREV_PRICE_PER_1K_OUTPUT";

/// Unit prices per 1000 tokens. Either price may be absent; cost estimation
/// is suppressed then, token counts are still shown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pricing {
    pub per_1k_input: Option<f64>,
    pub per_1k_output: Option<f64>,
}

impl Pricing {
    pub fn new(per_1k_input: Option<f64>, per_1k_output: Option<f64>) -> Pricing {
        Pricing {
            per_1k_input,
            per_1k_output,
        }
    }

    /// Prices from the environment; unset or unparseable variables count as
    /// absent rather than erroring, since pricing is display-only.
    pub fn from_env() -> Pricing {
        Pricing {
            per_1k_input: env_price(PRICE_PER_1K_INPUT_VAR),
            per_1k_output: env_price(PRICE_PER_1K_OUTPUT_VAR),
        }
    }
}

fn env_price(var: &str) -> Option<f64> {
    env::var(var).ok()?.trim().parse().ok()
}

/// Estimated cost in currency units, or `None` when either price is absent.
pub fn estimate_cost(usage: &UsageSummary, pricing: &Pricing) -> Option<f64> {
    let price_in = pricing.per_1k_input?;
    let price_out = pricing.per_1k_output?;
    Some(
        usage.input_tokens as f64 / 1000.0 * price_in
            + usage.output_tokens as f64 / 1000.0 * price_out,
    )
}
