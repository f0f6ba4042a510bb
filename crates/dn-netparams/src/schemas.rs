//! JSON parameter schemas.
//!
//! Each schema denies unknown fields; missing fields take their zero value
//! and are then caught by the schema's rules where that matters.

use crate::values::Rule;
use serde::{Deserialize, Serialize};

/// Margin levels as multiples of maintenance margin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingFactors {
    pub search_level: f64,
    pub initial_margin: f64,
    pub collateral_release: f64,
}

#[must_use]
pub fn scaling_factors_ordered() -> Rule<ScalingFactors> {
    Box::new(|f| {
        if f.search_level >= f.initial_margin {
            return Err(format!(
                "invalid scaling factors (searchLevel({}) >= initialMargin({}))",
                f.search_level, f.initial_margin
            ));
        }
        if f.initial_margin >= f.collateral_release {
            return Err(format!(
                "invalid scaling factors (initialMargin({}) >= collateralRelease({}))",
                f.initial_margin, f.collateral_release
            ));
        }
        Ok(())
    })
}

#[must_use]
pub fn scaling_factors_range(min: f64, max: f64) -> Rule<ScalingFactors> {
    Box::new(move |f| {
        let fields = [
            ("search_level", f.search_level),
            ("initial_margin", f.initial_margin),
            ("collateral_release", f.collateral_release),
        ];
        for (name, v) in fields {
            if v < min || v > max {
                return Err(format!("{name} must be within [{min}, {max}], got {v}"));
            }
        }
        Ok(())
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceMonitoringTrigger {
    /// Seconds.
    pub horizon: i64,
    /// Decimal text in (0, 1).
    pub probability: String,
    /// Seconds.
    pub auction_extension: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceMonitoringParameters {
    pub triggers: Vec<PriceMonitoringTrigger>,
}

#[must_use]
pub fn price_monitoring_triggers() -> Rule<PriceMonitoringParameters> {
    Box::new(|params| {
        for trigger in &params.triggers {
            if trigger.horizon <= 0 {
                return Err(format!(
                    "triggers.horizon must be greater than `0`, got `{}`",
                    trigger.horizon
                ));
            }
            let probability = trigger
                .probability
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite())
                .ok_or_else(|| {
                    format!(
                        "triggers.probability must be greater than `0`, got `{}`",
                        trigger.probability
                    )
                })?;
            if probability <= 0.0 {
                return Err(format!(
                    "triggers.probability must be greater than `0`, got `{}`",
                    trigger.probability
                ));
            }
            if probability >= 1.0 {
                return Err(format!(
                    "triggers.probability must be lower than `1`, got `{}`",
                    trigger.probability
                ));
            }
            if trigger.auction_extension <= 0 {
                return Err(format!(
                    "triggers.auction_extension must be greater than `0`, got `{}`",
                    trigger.auction_extension
                ));
            }
        }
        Ok(())
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VestingBenefitTier {
    pub minimum_quantum_balance: String,
    pub reward_multiplier: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VestingBenefitTiers {
    pub tiers: Vec<VestingBenefitTier>,
}

#[must_use]
pub fn vesting_benefit_tiers() -> Rule<VestingBenefitTiers> {
    Box::new(|tiers| {
        for (i, tier) in tiers.tiers.iter().enumerate() {
            let balance_ok = !tier.minimum_quantum_balance.is_empty()
                && tier.minimum_quantum_balance.bytes().all(|b| b.is_ascii_digit());
            if !balance_ok {
                return Err(format!(
                    "tiers[{i}].minimum_quantum_balance must be a positive integer, got `{}`",
                    tier.minimum_quantum_balance
                ));
            }
            match tier.reward_multiplier.parse::<f64>() {
                Ok(m) if m.is_finite() && m >= 1.0 => {}
                _ => {
                    return Err(format!(
                        "tiers[{i}].reward_multiplier must be >= 1, got `{}`",
                        tier.reward_multiplier
                    ))
                }
            }
        }
        Ok(())
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EthereumContract {
    pub address: String,
    pub deployment_block_height: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EthereumConfig {
    pub network_id: String,
    pub chain_id: String,
    pub collateral_bridge_contract: EthereumContract,
    pub confirmations: u32,
    pub staking_bridge_contract: EthereumContract,
    pub token_vesting_contract: EthereumContract,
    pub multisig_control_contract: EthereumContract,
}

#[must_use]
pub fn ethereum_config() -> Rule<EthereumConfig> {
    Box::new(|cfg| {
        if cfg.network_id.is_empty() {
            return Err("missing network ID".into());
        }
        if cfg.chain_id.is_empty() {
            return Err("missing chain ID".into());
        }
        if cfg.confirmations == 0 {
            return Err("confirmations must be greater than 0".into());
        }
        let contracts = [
            ("collateral_bridge_contract", &cfg.collateral_bridge_contract),
            ("staking_bridge_contract", &cfg.staking_bridge_contract),
            ("token_vesting_contract", &cfg.token_vesting_contract),
            ("multisig_control_contract", &cfg.multisig_control_contract),
        ];
        for (name, contract) in contracts {
            if contract.address.is_empty() {
                return Err(format!("missing {name} address"));
            }
        }
        Ok(())
    })
}
