//! Default parameter table.
//!
//! Every known key is registered here with its kind, rules and starting
//! value. A key missing from this table cannot be read, updated or loaded
//! from genesis.

use crate::duration::{HOUR, MINUTE, SECOND};
use crate::error::NetParamsResult;
use crate::keys::*;
use crate::schemas::{
    ethereum_config, price_monitoring_triggers, scaling_factors_ordered, scaling_factors_range,
    vesting_benefit_tiers, EthereumConfig, PriceMonitoringParameters, ScalingFactors,
    VestingBenefitTiers,
};
use crate::values::{
    duration_gt, duration_gte, duration_lte, gt, gte, lt, lte, Relation, Rule, Value,
};
use primitive_types::U256;
use std::collections::BTreeMap;

const DAY: i64 = 24 * HOUR;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

const DEFAULT_ETHEREUM_CONFIG: &str = r#"{"network_id": "XXX", "chain_id": "XXX", "collateral_bridge_contract": {"address": "0xXXX"}, "confirmations": 3, "staking_bridge_contract": {"address": "0xXXX", "deployment_block_height": 0}, "token_vesting_contract": {"address": "0xXXX", "deployment_block_height": 0}, "multisig_control_contract": {"address": "0xXXX", "deployment_block_height": 0}}"#;

/// A rule between two parameters: `key` must stand in `relation` to the
/// current value of `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub key: &'static str,
    pub relation: Relation,
    pub other: &'static str,
}

pub const DEPENDENCIES: [Dependency; 5] = [
    Dependency {
        key: MARKET_AUCTION_MINIMUM_DURATION,
        relation: Relation::Lt,
        other: MARKET_AUCTION_MAXIMUM_DURATION,
    },
    Dependency {
        key: MARKET_AUCTION_MAXIMUM_DURATION,
        relation: Relation::Gt,
        other: MARKET_AUCTION_MINIMUM_DURATION,
    },
    Dependency {
        key: NUMBER_ETH_MULTISIG_SIGNERS,
        relation: Relation::Lte,
        other: NUMBER_OF_TENDERMINT_VALIDATORS,
    },
    Dependency {
        key: NUMBER_OF_TENDERMINT_VALIDATORS,
        relation: Relation::Gte,
        other: NUMBER_ETH_MULTISIG_SIGNERS,
    },
    Dependency {
        key: MARKET_LIQUIDITY_PROVIDERS_FEE_CALCULATION_TIME_STEP,
        relation: Relation::Lte,
        other: VALIDATORS_EPOCH_LENGTH,
    },
];

fn uint(v: u64) -> U256 {
    U256::from(v)
}

fn fraction() -> Vec<Rule<f64>> {
    vec![gte(0.0), lte(1.0)]
}

fn one_of(allowed: &'static [&'static str]) -> Rule<String> {
    Box::new(move |v| {
        if allowed.contains(&v.as_str()) {
            Ok(())
        } else {
            Err(format!("expect one of {allowed:?} got {v}"))
        }
    })
}

struct Table(BTreeMap<String, Value>);

impl Table {
    fn put(&mut self, key: impl Into<String>, value: Value, raw: &str) -> NetParamsResult<()> {
        let key = key.into();
        let value = value.initial(raw).map_err(|e| e.for_key(&key))?;
        self.0.insert(key, value);
        Ok(())
    }
}

fn governance(table: &mut Table) -> NetParamsResult<()> {
    for kind in GOVERNANCE_PROPOSAL_TYPES {
        let durations: &[(&str, &str)] = if kind == "freeform" {
            &[("minClose", "48h0m0s"), ("maxClose", "8760h0m0s")]
        } else {
            &[
                ("minClose", "48h0m0s"),
                ("maxClose", "8760h0m0s"),
                ("minEnact", "48h0m0s"),
                ("maxEnact", "8760h0m0s"),
            ]
        };
        for (param, raw) in durations {
            table.put(
                proposal_key(kind, param),
                Value::duration(vec![duration_gte(SECOND), duration_lte(YEAR)]),
                raw,
            )?;
        }
        table.put(
            proposal_key(kind, "requiredParticipation"),
            Value::float(fraction()),
            "0.00001",
        )?;
        table.put(
            proposal_key(kind, "requiredMajority"),
            Value::float(vec![gte(0.5), lte(1.0)]),
            "0.66",
        )?;
        for param in ["minProposerBalance", "minVoterBalance"] {
            table.put(
                proposal_key(kind, param),
                Value::uint(vec![gte(uint(1)), lt(U256::MAX)]),
                "1",
            )?;
        }
    }

    table.put(
        proposal_key("updateMarket", "requiredParticipationLP"),
        Value::float(fraction()),
        "0.00001",
    )?;
    table.put(
        proposal_key("updateMarket", "requiredMajorityLP"),
        Value::float(vec![gte(0.5), lte(1.0)]),
        "0.66",
    )?;
    table.put(
        proposal_key("updateMarket", "minProposerEquityLikeShare"),
        Value::float(fraction()),
        "0.1",
    )?;
    table.put(
        GOVERNANCE_TRANSFER_MAX_AMOUNT,
        Value::float(vec![gte(1.0)]),
        "7000",
    )?;
    table.put(
        GOVERNANCE_TRANSFER_MAX_FRACTION,
        Value::float(vec![gt(0.0), lte(1.0)]),
        "1",
    )
}

fn markets(table: &mut Table) -> NetParamsResult<()> {
    for key in [
        SPOT_MARKET_TRADING_ENABLED,
        PERPS_MARKET_TRADING_ENABLED,
        ETHEREUM_ORACLES_ENABLED,
    ] {
        table.put(key, Value::int(vec![gte(0), lte(1)]), "0")?;
    }
    table.put(
        MAX_PEGGED_ORDERS,
        Value::uint(vec![gte(uint(0)), lte(uint(10_000))]),
        "1500",
    )?;

    table.put(
        MARKET_MARGIN_SCALING_FACTORS,
        Value::json::<ScalingFactors>(vec![
            scaling_factors_ordered(),
            scaling_factors_range(1.0, 100.0),
        ]),
        r#"{"search_level": 1.1, "initial_margin": 1.2, "collateral_release": 1.4}"#,
    )?;
    table.put(MARKET_FEE_FACTORS_MAKER_FEE, Value::float(fraction()), "0.00025")?;
    table.put(
        MARKET_FEE_FACTORS_INFRASTRUCTURE_FEE,
        Value::float(fraction()),
        "0.0005",
    )?;
    table.put(
        MARKET_AUCTION_MINIMUM_DURATION,
        Value::duration(vec![duration_gte(SECOND), duration_lte(DAY)]),
        "30m0s",
    )?;
    table.put(
        MARKET_AUCTION_MAXIMUM_DURATION,
        Value::duration(vec![duration_gte(SECOND), duration_lte(MONTH)]),
        "168h0m0s",
    )?;
    table.put(
        MARKET_TARGET_STAKE_TIME_WINDOW,
        Value::duration(vec![duration_gte(SECOND), duration_lte(MONTH)]),
        "1h0m0s",
    )?;
    table.put(
        MARKET_TARGET_STAKE_SCALING_FACTOR,
        Value::float(vec![gt(0.0), lte(100.0)]),
        "10",
    )?;
    table.put(
        MARKET_LIQUIDITY_TARGET_STAKE_TRIGGERING_RATIO,
        Value::float(fraction()),
        "0",
    )?;
    table.put(
        MARKET_VALUE_WINDOW_LENGTH,
        Value::duration(vec![duration_gte(MINUTE), duration_lte(MONTH)]),
        "168h0m0s",
    )?;
    table.put(
        MARKET_PRICE_MONITORING_DEFAULT_PARAMETERS,
        Value::json::<PriceMonitoringParameters>(vec![price_monitoring_triggers()]),
        r#"{"triggers": []}"#,
    )?;
    table.put(
        MARKET_LIQUIDITY_PROVISION_SHAPES_MAX_SIZE,
        Value::int(vec![gte(1), lte(1000)]),
        "5",
    )?;
    table.put(
        MARKET_LIQUIDITY_BOND_PENALTY_PARAMETER,
        Value::float(vec![gte(0.0), lte(1000.0)]),
        "0.1",
    )?;
    table.put(
        MARKET_LIQUIDITY_EARLY_EXIT_PENALTY,
        Value::float(vec![gte(0.0), lte(1000.0)]),
        "0.05",
    )?;
    table.put(
        MARKET_LIQUIDITY_PROVIDERS_FEE_CALCULATION_TIME_STEP,
        Value::duration(vec![duration_gte(SECOND), duration_lte(255 * HOUR)]),
        "1m",
    )?;
    table.put(
        MARKET_SUCCESSOR_LAUNCH_WINDOW,
        Value::duration(vec![duration_gte(SECOND), duration_lte(MONTH)]),
        "168h",
    )
}

fn rewards(table: &mut Table) -> NetParamsResult<()> {
    table.put(
        STAKING_AND_DELEGATION_REWARD_PAYOUT_FRACTION,
        Value::float(fraction()),
        "1.0",
    )?;
    table.put(
        STAKING_AND_DELEGATION_REWARD_PAYOUT_DELAY,
        Value::duration(vec![duration_gte(0)]),
        "24h0m0s",
    )?;
    table.put(
        STAKING_AND_DELEGATION_REWARD_MAX_PAYOUT_PER_EPOCH,
        Value::float(vec![gte(0.0)]),
        "7000000000000000000000",
    )?;
    table.put(
        STAKING_AND_DELEGATION_REWARD_DELEGATOR_SHARE,
        Value::float(fraction()),
        "0.883",
    )?;
    table.put(
        STAKING_AND_DELEGATION_REWARD_COMPETITION_LEVEL,
        Value::float(vec![gte(1.0)]),
        "1.1",
    )?;
    table.put(
        STAKING_AND_DELEGATION_REWARDS_MIN_VALIDATORS,
        Value::int(vec![gte(1), lte(500)]),
        "5",
    )?;
    table.put(REWARD_ASSET, Value::string(Vec::new()), "VOTE")?;
    table.put(
        REWARDS_VESTING_BASE_RATE,
        Value::float(vec![gt(0.0), lte(1.0)]),
        "0.25",
    )?;
    table.put(
        REWARDS_VESTING_BENEFIT_TIERS,
        Value::json::<VestingBenefitTiers>(vec![vesting_benefit_tiers()]),
        r#"{"tiers": []}"#,
    )
}

fn spam(table: &mut Table) -> NetParamsResult<()> {
    table.put(SPAM_PROTECTION_MAX_VOTES, Value::int(vec![gte(1)]), "3")?;
    table.put(
        SPAM_PROTECTION_MIN_TOKENS_FOR_VOTING,
        Value::float(vec![gte(1.0)]),
        "100000000000000000000",
    )?;
    table.put(SPAM_PROTECTION_MAX_PROPOSALS, Value::int(vec![gte(1)]), "3")?;
    table.put(SPAM_PROTECTION_MAX_DELEGATIONS, Value::int(vec![gte(1)]), "390")?;
    table.put(
        SPAM_PROTECTION_MAX_BATCH_SIZE,
        Value::uint(vec![gte(uint(2)), lte(uint(200))]),
        "15",
    )?;
    table.put(
        SPAM_PROTECTION_BALANCE_SNAPSHOT_FREQUENCY,
        Value::duration(vec![duration_gte(0), duration_lte(HOUR)]),
        "5s",
    )?;
    table.put(
        SPAM_POW_DIFFICULTY,
        Value::uint(vec![gte(uint(0)), lte(uint(256))]),
        "15",
    )?;
    table.put(
        SPAM_POW_HASH_FUNCTION,
        Value::string(vec![one_of(&["sha3_24_rounds"])]),
        "sha3_24_rounds",
    )?;
    table.put(
        TRANSFER_MAX_COMMANDS_PER_EPOCH,
        Value::int(vec![gte(0)]),
        "20",
    )
}

fn network(table: &mut Table) -> NetParamsResult<()> {
    table.put(
        VALIDATORS_EPOCH_LENGTH,
        Value::duration(vec![duration_gte(SECOND), duration_lte(255 * HOUR)]),
        "24h0m0s",
    )?;
    table.put(
        VALIDATORS_VOTE_REQUIRED,
        Value::float(vec![gt(0.0), lte(1.0)]),
        "0.67",
    )?;
    table.put(DELEGATION_MIN_AMOUNT, Value::float(vec![gt(0.0)]), "1")?;
    table.put(
        NUMBER_OF_TENDERMINT_VALIDATORS,
        Value::uint(vec![gte(uint(1)), lte(uint(500))]),
        "30",
    )?;
    table.put(
        NUMBER_ETH_MULTISIG_SIGNERS,
        Value::uint(vec![gte(uint(1)), lte(uint(500))]),
        "13",
    )?;
    table.put(
        NETWORK_CHECKPOINT_TIME_ELAPSED_BETWEEN_CHECKPOINTS,
        Value::duration(vec![duration_gt(0)]),
        "1m",
    )?;
    table.put(SNAPSHOT_INTERVAL_LENGTH, Value::uint(vec![gte(uint(1))]), "1000")?;
    table.put(
        MARK_PRICE_UPDATE_MAXIMUM_FREQUENCY,
        Value::duration(vec![duration_gt(0), duration_lte(DAY)]),
        "5s",
    )?;
    table.put(
        BLOCKCHAINS_ETHEREUM_CONFIG,
        Value::json::<EthereumConfig>(vec![ethereum_config()]),
        DEFAULT_ETHEREUM_CONFIG,
    )?;
    table.put(TRANSFER_FEE_FACTOR, Value::float(fraction()), "0.001")?;
    table.put(
        TRANSFER_MIN_TRANSFER_QUANTUM_MULTIPLE,
        Value::float(vec![gte(0.0)]),
        "0.1",
    )
}

/// Build the table of every known parameter at its default value.
pub fn default_values() -> NetParamsResult<BTreeMap<String, Value>> {
    let mut table = Table(BTreeMap::new());
    governance(&mut table)?;
    markets(&mut table)?;
    rewards(&mut table)?;
    spam(&mut table)?;
    network(&mut table)?;
    Ok(table.0)
}
