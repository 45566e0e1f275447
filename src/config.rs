use crate::types::ScriptVariant;

/// One day, in seconds.
pub const DEFAULT_EXPIRATION_WINDOW_SECS: u64 = 86_400;

/// Virtual size of a redeem spend paying to P2WPKH, rounded up with a
/// 72 byte signature and the longest (98 byte) witness script. The refund
/// spend is smaller, so the same figure covers both paths.
pub const DEFAULT_SPEND_VSIZE: u64 = 143;

/// Policy values for the contract factory and the spend builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HtlcConfig {
    /// Seconds added to the creation time when no expiration is supplied
    pub expiration_window_secs: u64,
    /// Which script template new contracts are compiled with
    pub script_variant: ScriptVariant,
    /// Fixed virtual size the fee rate is multiplied by
    pub spend_vsize: u64,
}

impl Default for HtlcConfig {
    fn default() -> Self {
        HtlcConfig {
            expiration_window_secs: DEFAULT_EXPIRATION_WINDOW_SECS,
            script_variant: ScriptVariant::SizeChecked,
            spend_vsize: DEFAULT_SPEND_VSIZE,
        }
    }
}

impl HtlcConfig {
    pub fn with_script_variant(mut self, script_variant: ScriptVariant) -> Self {
        self.script_variant = script_variant;
        self
    }

    pub fn with_spend_vsize(mut self, spend_vsize: u64) -> Self {
        self.spend_vsize = spend_vsize;
        self
    }

    pub fn with_expiration_window(mut self, secs: u64) -> Self {
        self.expiration_window_secs = secs;
        self
    }
}
