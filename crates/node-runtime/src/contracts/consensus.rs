//! Consensus contract
//!
//! Writes the round records the round scheduler reads back:
//!
//! - `InitialRound(Round)`: round 1 and the miner list, once per chain
//! - `NextRound(Round)`: round `n + 1`, proposed by a current miner
//! - `UpdateValue(u64)`: the sender produced a block in round `n`

use super::{decode_params, encode_params, CallError, CallOutput, CallResult};
use kc_01_state_storage::StateDelta;
use kc_02_consensus_rounds::consensus_state::{self, miners_key, round_key, round_number_key};
use kc_02_consensus_rounds::{ConsensusError, Miners, Round};
use kc_03_parallel_execution::{AccessPattern, ExecutionContext, StateReader};
use serde::de::DeserializeOwned;
use shared_types::{Address, LogEvent, StateKey, Transaction};

pub const INITIAL_ROUND: &str = "InitialRound";
pub const NEXT_ROUND: &str = "NextRound";
pub const UPDATE_VALUE: &str = "UpdateValue";

impl From<ConsensusError> for CallError {
    fn from(e: ConsensusError) -> Self {
        match e {
            ConsensusError::State(e) => CallError::State(e),
            other => CallError::Fault(other.to_string()),
        }
    }
}

// === TRANSACTION BUILDERS ===

pub fn initial_round(contract: Address, from: Address, round: &Round) -> Transaction {
    Transaction::new(from, contract, INITIAL_ROUND, encode_params(round))
}

pub fn next_round(contract: Address, from: Address, round: &Round) -> Transaction {
    Transaction::new(from, contract, NEXT_ROUND, encode_params(round))
}

pub fn update_value(contract: Address, from: Address, round_number: u64) -> Transaction {
    Transaction::new(from, contract, UPDATE_VALUE, encode_params(&round_number))
}

// === CONTRACT ===

pub(crate) fn access_pattern(transaction: &Transaction) -> CallResult<AccessPattern> {
    let contract = transaction.to;
    match transaction.method_name.as_str() {
        INITIAL_ROUND => Ok(AccessPattern::new().with_writes(vec![
            round_number_key(contract),
            round_key(contract, 1),
            miners_key(contract),
        ])),
        NEXT_ROUND => {
            let round: Round = decode_params(transaction)?;
            Ok(AccessPattern::new()
                .with_reads(vec![miners_key(contract)])
                .with_writes(vec![
                    round_number_key(contract),
                    round_key(contract, round.round_number),
                ]))
        }
        UPDATE_VALUE => {
            let round_number: u64 = decode_params(transaction)?;
            Ok(AccessPattern::new()
                .with_reads(vec![round_number_key(contract)])
                .with_writes(vec![round_key(contract, round_number)]))
        }
        _ => Err(CallError::Fault(super::unknown_method(transaction))),
    }
}

async fn read<T: DeserializeOwned>(state: &dyn StateReader, key: &StateKey) -> CallResult<Option<T>> {
    match state.get(key).await? {
        Some(bytes) => Ok(Some(consensus_state::decode(key, &bytes)?)),
        None => Ok(None),
    }
}

fn put<T: serde::Serialize>(writes: &mut StateDelta, key: StateKey, value: &T) -> CallResult<()> {
    let bytes = consensus_state::encode(&key, value)?;
    writes.set(key, bytes);
    Ok(())
}

fn check_round(round: &Round) -> CallResult<()> {
    if round.miners.is_empty() {
        return Err(CallError::fault(format!("round {} has no miners", round.round_number)));
    }
    round.validate_orders()?;
    Ok(())
}

fn round_log(contract: Address, name: &str, round_number: u64) -> LogEvent {
    LogEvent::new(contract, name).with_non_indexed(round_number.to_le_bytes().to_vec())
}

pub(crate) async fn call(
    context: &ExecutionContext,
    transaction: &Transaction,
    state: &dyn StateReader,
) -> CallResult<CallOutput> {
    let contract = transaction.to;
    let number_key = round_number_key(contract);
    let current: u64 = read(state, &number_key).await?.unwrap_or_default();
    let mut writes = StateDelta::new();

    match transaction.method_name.as_str() {
        INITIAL_ROUND => {
            let round: Round = decode_params(transaction)?;
            if current != 0 {
                return Err(CallError::fault(format!(
                    "consensus already initialized at round {current}"
                )));
            }
            if round.round_number != 1 {
                return Err(CallError::fault(format!(
                    "initial round must be round 1, got {}",
                    round.round_number
                )));
            }
            check_round(&round)?;

            let addresses = round.ordered_miners().iter().map(|m| m.address).collect();
            let miners = Miners::new(round.term_number, addresses);
            put(&mut writes, number_key, &1u64)?;
            put(&mut writes, round_key(contract, 1), &round)?;
            put(&mut writes, miners_key(contract), &miners)?;

            Ok(CallOutput {
                writes,
                logs: vec![round_log(contract, "RoundInitialized", 1)],
                ..Default::default()
            })
        }
        NEXT_ROUND => {
            let round: Round = decode_params(transaction)?;
            if current == 0 {
                return Err(ConsensusError::RoundNotInitialized.into());
            }
            if round.round_number != current + 1 {
                return Err(CallError::fault(format!(
                    "next round must be {}, got {}",
                    current + 1,
                    round.round_number
                )));
            }
            let miners: Miners = read(state, &miners_key(contract)).await?.unwrap_or_default();
            if !miners.contains(&transaction.from) {
                return Err(ConsensusError::UnknownMiner(hex::encode(transaction.from)).into());
            }
            if round.miners.keys().any(|address| !miners.contains(address)) {
                return Err(CallError::fault("next round names a miner outside the miner list"));
            }
            check_round(&round)?;

            put(&mut writes, number_key, &round.round_number)?;
            put(&mut writes, round_key(contract, round.round_number), &round)?;

            Ok(CallOutput {
                writes,
                logs: vec![round_log(contract, "RoundChanged", round.round_number)],
                ..Default::default()
            })
        }
        UPDATE_VALUE => {
            let round_number: u64 = decode_params(transaction)?;
            if round_number != current {
                return Err(CallError::fault(format!(
                    "round {round_number} is not the current round {current}"
                )));
            }
            let key = round_key(contract, round_number);
            let mut round: Round = read(state, &key)
                .await?
                .ok_or(ConsensusError::RoundNotInitialized)?;
            round.record_production(&transaction.from, context.block_timestamp)?;
            put(&mut writes, key, &round)?;

            Ok(CallOutput {
                writes,
                ..Default::default()
            })
        }
        _ => Err(CallError::Fault(super::unknown_method(transaction))),
    }
}
