//! Key/value contract
//!
//! Values live under `StateKey(KV_CONTRACT, key)`. Counters are `u64`
//! little endian; a missing key reads as zero.

use super::{decode_params, encode_params, CallError, CallOutput, CallResult, KV_CONTRACT};
use kc_01_state_storage::StateDelta;
use kc_03_parallel_execution::{AccessPattern, StateReader};
use serde::{Deserialize, Serialize};
use shared_types::{Address, LogEvent, StateKey, Transaction};

pub const SET: &str = "Set";
pub const INCREMENT: &str = "Increment";
pub const TRANSFER: &str = "Transfer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetInput {
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementInput {
    pub key: String,
    pub by: u64,
}

/// Move `amount` from one counter to another; reverts on insufficient funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferInput {
    pub from_key: String,
    pub to_key: String,
    pub amount: u64,
}

pub fn key(name: &str) -> StateKey {
    StateKey::new(KV_CONTRACT, name)
}

pub fn decode_counter(bytes: Option<&[u8]>) -> u64 {
    bytes
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
        .map(u64::from_le_bytes)
        .unwrap_or_default()
}

// === TRANSACTION BUILDERS ===

pub fn set(from: Address, key: &str, value: Vec<u8>) -> Transaction {
    let input = SetInput {
        key: key.to_string(),
        value,
    };
    Transaction::new(from, KV_CONTRACT, SET, encode_params(&input))
}

pub fn increment(from: Address, key: &str, by: u64) -> Transaction {
    let input = IncrementInput {
        key: key.to_string(),
        by,
    };
    Transaction::new(from, KV_CONTRACT, INCREMENT, encode_params(&input))
}

pub fn transfer(from: Address, from_key: &str, to_key: &str, amount: u64) -> Transaction {
    let input = TransferInput {
        from_key: from_key.to_string(),
        to_key: to_key.to_string(),
        amount,
    };
    Transaction::new(from, KV_CONTRACT, TRANSFER, encode_params(&input))
}

// === CONTRACT ===

pub(crate) fn access_pattern(transaction: &Transaction) -> CallResult<AccessPattern> {
    match transaction.method_name.as_str() {
        SET => {
            let input: SetInput = decode_params(transaction)?;
            Ok(AccessPattern::new().with_writes(vec![key(&input.key)]))
        }
        INCREMENT => {
            let input: IncrementInput = decode_params(transaction)?;
            Ok(AccessPattern::new().with_writes(vec![key(&input.key)]))
        }
        TRANSFER => {
            let input: TransferInput = decode_params(transaction)?;
            Ok(AccessPattern::new().with_writes(vec![key(&input.from_key), key(&input.to_key)]))
        }
        _ => Err(CallError::Fault(super::unknown_method(transaction))),
    }
}

async fn read_counter(state: &dyn StateReader, key: &StateKey) -> CallResult<u64> {
    let bytes = state.get(key).await?;
    Ok(decode_counter(bytes.as_deref()))
}

pub(crate) async fn call(transaction: &Transaction, state: &dyn StateReader) -> CallResult<CallOutput> {
    let mut writes = StateDelta::new();

    match transaction.method_name.as_str() {
        SET => {
            let input: SetInput = decode_params(transaction)?;
            writes.set(key(&input.key), input.value);
            Ok(CallOutput {
                writes,
                ..Default::default()
            })
        }
        INCREMENT => {
            let input: IncrementInput = decode_params(transaction)?;
            let key = key(&input.key);
            let value = read_counter(state, &key)
                .await?
                .checked_add(input.by)
                .ok_or_else(|| CallError::fault(format!("counter {} overflows", input.key)))?;
            writes.set(key, value.to_le_bytes().to_vec());
            Ok(CallOutput {
                writes,
                return_value: value.to_le_bytes().to_vec(),
                ..Default::default()
            })
        }
        TRANSFER => {
            let input: TransferInput = decode_params(transaction)?;
            let from = key(&input.from_key);
            let to = key(&input.to_key);
            let balance = read_counter(state, &from).await?;
            if balance < input.amount {
                return Err(CallError::fault(format!(
                    "insufficient balance in {}: {} < {}",
                    input.from_key, balance, input.amount
                )));
            }
            if from != to {
                let target = read_counter(state, &to)
                    .await?
                    .checked_add(input.amount)
                    .ok_or_else(|| CallError::fault(format!("counter {} overflows", input.to_key)))?;
                writes.set(from, (balance - input.amount).to_le_bytes().to_vec());
                writes.set(to, target.to_le_bytes().to_vec());
            }
            let log = LogEvent::new(KV_CONTRACT, "Transferred")
                .with_non_indexed(input.amount.to_le_bytes().to_vec());
            Ok(CallOutput {
                writes,
                logs: vec![log],
                ..Default::default()
            })
        }
        _ => Err(CallError::Fault(super::unknown_method(transaction))),
    }
}
