// ============================================================================
// FEE CALCULATIONS
// ============================================================================

use bitcoin::Amount;

use crate::errors::{HtlcError, Result};

/// Fee for an HTLC spend: `fee_rate` sat/vB times the fixed size estimate.
///
/// This is an approximation. The finished transaction is not measured.
pub fn calculate_spend_fee(fee_rate: u64, spend_vsize: u64) -> Result<Amount> {
    let fee = fee_rate
        .checked_mul(spend_vsize)
        .ok_or(HtlcError::FeeOverflow {
            fee_rate,
            vsize: spend_vsize,
        })?;
    Ok(Amount::from_sat(fee))
}

/// What is left for the single output once the fee is paid.
///
/// A zero or negative remainder is a [`HtlcError::Fee`]; the builder never
/// emits an empty output.
pub fn spend_output_value(value: Amount, fee: Amount) -> Result<Amount> {
    match value.checked_sub(fee) {
        Some(remaining) if remaining > Amount::ZERO => Ok(remaining),
        _ => Err(HtlcError::Fee {
            value: value.to_sat(),
            fee: fee.to_sat(),
        }),
    }
}
