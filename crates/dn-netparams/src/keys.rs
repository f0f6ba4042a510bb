//! Parameter keys.
//!
//! Keys are dot separated and part of the public configuration surface:
//! genesis files, governance proposals and checkpoints all refer to them by
//! these exact strings.

// Limits
pub const SPOT_MARKET_TRADING_ENABLED: &str = "limits.markets.proposeSpotEnabled";
pub const PERPS_MARKET_TRADING_ENABLED: &str = "limits.markets.proposePerpetualEnabled";
pub const ETHEREUM_ORACLES_ENABLED: &str = "ethereum.oracles.enabled";
pub const MAX_PEGGED_ORDERS: &str = "limits.markets.maxPeggedOrders";

// Markets
pub const MARKET_MARGIN_SCALING_FACTORS: &str = "market.margin.scalingFactors";
pub const MARKET_FEE_FACTORS_MAKER_FEE: &str = "market.fee.factors.makerFee";
pub const MARKET_FEE_FACTORS_INFRASTRUCTURE_FEE: &str = "market.fee.factors.infrastructureFee";
pub const MARKET_AUCTION_MINIMUM_DURATION: &str = "market.auction.minimumDuration";
pub const MARKET_AUCTION_MAXIMUM_DURATION: &str = "market.auction.maximumDuration";
pub const MARKET_TARGET_STAKE_TIME_WINDOW: &str = "market.stake.target.timeWindow";
pub const MARKET_TARGET_STAKE_SCALING_FACTOR: &str = "market.stake.target.scalingFactor";
pub const MARKET_LIQUIDITY_TARGET_STAKE_TRIGGERING_RATIO: &str =
    "market.liquidity.targetstake.triggering.ratio";
pub const MARKET_VALUE_WINDOW_LENGTH: &str = "market.value.windowLength";
pub const MARKET_PRICE_MONITORING_DEFAULT_PARAMETERS: &str =
    "market.monitor.price.defaultParameters";
pub const MARKET_LIQUIDITY_PROVISION_SHAPES_MAX_SIZE: &str =
    "market.liquidityProvision.shapes.maxSize";
pub const MARKET_LIQUIDITY_BOND_PENALTY_PARAMETER: &str = "market.liquidity.bondPenaltyParameter";
pub const MARKET_LIQUIDITY_EARLY_EXIT_PENALTY: &str = "market.liquidity.earlyExitPenalty";
pub const MARKET_LIQUIDITY_PROVIDERS_FEE_CALCULATION_TIME_STEP: &str =
    "market.liquidity.providersFeeCalculationTimeStep";
pub const MARKET_SUCCESSOR_LAUNCH_WINDOW: &str = "market.liquidity.successorLaunchWindowLength";

// Governance proposals, one family per proposal type.
pub const GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE: &str = "governance.proposal.market.minClose";
pub const GOVERNANCE_PROPOSAL_MARKET_MAX_CLOSE: &str = "governance.proposal.market.maxClose";
pub const GOVERNANCE_PROPOSAL_MARKET_MIN_ENACT: &str = "governance.proposal.market.minEnact";
pub const GOVERNANCE_PROPOSAL_MARKET_MAX_ENACT: &str = "governance.proposal.market.maxEnact";
pub const GOVERNANCE_PROPOSAL_MARKET_REQUIRED_PARTICIPATION: &str =
    "governance.proposal.market.requiredParticipation";
pub const GOVERNANCE_PROPOSAL_MARKET_REQUIRED_MAJORITY: &str =
    "governance.proposal.market.requiredMajority";
pub const GOVERNANCE_PROPOSAL_MARKET_MIN_PROPOSER_BALANCE: &str =
    "governance.proposal.market.minProposerBalance";
pub const GOVERNANCE_PROPOSAL_MARKET_MIN_VOTER_BALANCE: &str =
    "governance.proposal.market.minVoterBalance";

/// Proposal types sharing the close/enact/participation/majority/balance
/// parameter family.
pub const GOVERNANCE_PROPOSAL_TYPES: [&str; 7] = [
    "market",
    "asset",
    "updateAsset",
    "updateMarket",
    "updateNetParam",
    "freeform",
    "transfer",
];

pub const GOVERNANCE_TRANSFER_MAX_AMOUNT: &str = "governance.proposal.transfer.maxAmount";
pub const GOVERNANCE_TRANSFER_MAX_FRACTION: &str = "governance.proposal.transfer.maxFraction";

// Staking and delegation rewards
pub const STAKING_AND_DELEGATION_REWARD_PAYOUT_FRACTION: &str =
    "reward.staking.delegation.payoutFraction";
pub const STAKING_AND_DELEGATION_REWARD_PAYOUT_DELAY: &str = "reward.staking.delegation.payoutDelay";
pub const STAKING_AND_DELEGATION_REWARD_MAX_PAYOUT_PER_EPOCH: &str =
    "reward.staking.delegation.maxPayoutPerEpoch";
pub const STAKING_AND_DELEGATION_REWARD_DELEGATOR_SHARE: &str =
    "reward.staking.delegation.delegatorShare";
pub const STAKING_AND_DELEGATION_REWARD_COMPETITION_LEVEL: &str =
    "reward.staking.delegation.competitionLevel";
pub const STAKING_AND_DELEGATION_REWARDS_MIN_VALIDATORS: &str =
    "reward.staking.delegation.minValidators";
pub const REWARD_ASSET: &str = "reward.asset";
pub const REWARDS_VESTING_BASE_RATE: &str = "rewards.vesting.baseRate";
pub const REWARDS_VESTING_BENEFIT_TIERS: &str = "rewards.vesting.benefitTiers";

// Spam protection
pub const SPAM_PROTECTION_MAX_VOTES: &str = "spam.protection.max.votes";
pub const SPAM_PROTECTION_MIN_TOKENS_FOR_VOTING: &str = "spam.protection.voting.min.tokens";
pub const SPAM_PROTECTION_MAX_PROPOSALS: &str = "spam.protection.max.proposals";
pub const SPAM_PROTECTION_MAX_DELEGATIONS: &str = "spam.protection.max.delegations";
pub const SPAM_PROTECTION_MAX_BATCH_SIZE: &str = "spam.protection.max.batchSize";
pub const SPAM_PROTECTION_BALANCE_SNAPSHOT_FREQUENCY: &str =
    "spam.protection.balanceSnapshotFrequency";
pub const SPAM_POW_DIFFICULTY: &str = "spam.pow.difficulty";
pub const SPAM_POW_HASH_FUNCTION: &str = "spam.pow.hashFunction";

// Validators and network
pub const VALIDATORS_EPOCH_LENGTH: &str = "validators.epoch.length";
pub const VALIDATORS_VOTE_REQUIRED: &str = "validators.vote.required";
pub const DELEGATION_MIN_AMOUNT: &str = "validators.delegation.minAmount";
pub const NUMBER_OF_TENDERMINT_VALIDATORS: &str = "network.validators.tendermint.number";
pub const NUMBER_ETH_MULTISIG_SIGNERS: &str = "network.validators.multisig.numberOfSigners";
pub const NETWORK_CHECKPOINT_TIME_ELAPSED_BETWEEN_CHECKPOINTS: &str =
    "network.checkpoint.timeElapsedBetweenCheckpoints";
pub const SNAPSHOT_INTERVAL_LENGTH: &str = "snapshot.interval.length";
pub const MARK_PRICE_UPDATE_MAXIMUM_FREQUENCY: &str = "network.markPriceUpdateMaximumFrequency";
pub const BLOCKCHAINS_ETHEREUM_CONFIG: &str = "blockchains.ethereumConfig";

// Transfers
pub const TRANSFER_FEE_FACTOR: &str = "transfer.fee.factor";
pub const TRANSFER_MIN_TRANSFER_QUANTUM_MULTIPLE: &str = "transfer.minTransferQuantumMultiple";
pub const TRANSFER_MAX_COMMANDS_PER_EPOCH: &str = "spam.protection.maxUserTransfersPerEpoch";

/// Keys still carried for old state but skipped when loading genesis.
pub const DEPRECATED: [&str; 6] = [
    STAKING_AND_DELEGATION_REWARD_PAYOUT_FRACTION,
    STAKING_AND_DELEGATION_REWARD_PAYOUT_DELAY,
    STAKING_AND_DELEGATION_REWARD_MAX_PAYOUT_PER_EPOCH,
    MARKET_LIQUIDITY_TARGET_STAKE_TRIGGERING_RATIO,
    MARKET_TARGET_STAKE_TIME_WINDOW,
    MARKET_TARGET_STAKE_SCALING_FACTOR,
];

#[must_use]
pub fn is_deprecated(key: &str) -> bool {
    DEPRECATED.contains(&key)
}

/// Key of one member of a governance proposal parameter family, e.g.
/// `proposal_key("asset", "minClose")`.
#[must_use]
pub fn proposal_key(proposal_type: &str, param: &str) -> String {
    format!("governance.proposal.{proposal_type}.{param}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proposal_key_matches_constants() {
        assert_eq!(
            proposal_key("market", "minClose"),
            GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE
        );
        assert_eq!(
            proposal_key("market", "requiredMajority"),
            GOVERNANCE_PROPOSAL_MARKET_REQUIRED_MAJORITY
        );
    }

    #[test]
    fn test_deprecated() {
        assert!(is_deprecated(MARKET_TARGET_STAKE_TIME_WINDOW));
        assert!(!is_deprecated(MARKET_FEE_FACTORS_MAKER_FEE));
    }
}
