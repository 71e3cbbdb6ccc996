use bitcoin::address::AddressType;
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::script::{Builder, PushBytesBuf};
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::transaction::{OutPoint, Sequence, Version};
use bitcoin::{absolute, Address, Amount, Network, PrivateKey, PublicKey, ScriptBuf};
use bitcoin::{Transaction, TxIn, TxOut, Txid, Witness};
use std::str::FromStr;

use super::utxo::{total_value, UnspentOutput};
use crate::error::WalletError;

/// SIGHASH_ALL | SIGHASH_FORKID, the only sighash type BSV accepts for ordinary spends
pub const SIGHASH_ALL_FORKID: u32 = 0x41;

const SIGHASH_BASE_MASK: u32 = 0x1f;
const SIGHASH_ANYONECANPAY: u32 = 0x80;

/// How the fee of a send is decided
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeePolicy {
    /// Flat fee in satoshis
    Fixed(u64),
    /// Satoshis per byte of the estimated transaction size
    PerByte(f64),
}

impl FeePolicy {
    /// Fixed fee unless the caller asked for an explicit rate
    pub fn resolve(fixed_fee_sats: u64, fee_rate_sat_b: Option<f64>) -> Result<Self, WalletError> {
        match fee_rate_sat_b {
            None => Ok(FeePolicy::Fixed(fixed_fee_sats)),
            Some(rate) if rate.is_finite() && rate > 0.0 => Ok(FeePolicy::PerByte(rate)),
            Some(rate) => Err(WalletError::InvalidInput(format!(
                "Fee rate must be a positive number of sat/byte, got {}",
                rate
            ))),
        }
    }

    pub fn fee_for(&self, num_inputs: usize, num_outputs: usize) -> u64 {
        match *self {
            FeePolicy::Fixed(fee) => fee,
            FeePolicy::PerByte(rate) => {
                (estimate_tx_size(num_inputs, num_outputs) as f64 * rate).ceil() as u64
            }
        }
    }
}

/// Estimate the size in bytes of a transaction spending P2PKH inputs to P2PKH outputs
pub fn estimate_tx_size(num_inputs: usize, num_outputs: usize) -> u64 {
    let base_size = 10;
    let input_size = 148;
    let output_size = 34;

    (base_size + (num_inputs * input_size) + (num_outputs * output_size)) as u64
}

pub struct TransactionBuilder {
    network: Network,
}

impl TransactionBuilder {
    /// Create a new transaction builder for the specified network
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Parse a recipient: must be P2PKH on this builder's network
    pub fn parse_address(&self, address: &str) -> Result<Address, WalletError> {
        let address = Address::from_str(address.trim())
            .map_err(|e| WalletError::InvalidInput(format!("Invalid address: {}", e)))?
            .require_network(self.network)
            .map_err(|e| WalletError::InvalidInput(format!("Address network mismatch: {}", e)))?;

        if address.address_type() != Some(AddressType::P2pkh) {
            return Err(WalletError::InvalidInput(format!(
                "Only P2PKH addresses can receive BSV: {}",
                address
            )));
        }

        Ok(address)
    }

    /// Build an unsigned transaction spending every given UTXO.
    ///
    /// One output pays `amount_sats` to `to_address`; a second returns whatever is
    /// left after the fee to `change_address`, omitted when nothing is left.
    pub fn build_send_tx(
        &self,
        utxos: &[UnspentOutput],
        to_address: &Address,
        amount_sats: u64,
        change_address: &Address,
        fee_sats: u64,
    ) -> Result<Transaction, WalletError> {
        let total_input = total_value(utxos)?;
        let required = amount_sats
            .checked_add(fee_sats)
            .ok_or_else(|| WalletError::InvalidInput("Amount plus fee overflows".to_string()))?;

        if utxos.is_empty() || total_input < required {
            return Err(WalletError::InsufficientFunds {
                available: total_input,
                required,
            });
        }

        let change_amount = total_input - required;

        let mut tx = Transaction {
            version: Version::ONE,
            lock_time: absolute::LockTime::ZERO,
            input: Vec::with_capacity(utxos.len()),
            output: Vec::with_capacity(2),
        };

        for utxo in utxos {
            tx.input.push(TxIn {
                previous_output: OutPoint {
                    txid: Txid::from_str(&utxo.transaction_id)
                        .map_err(|e| WalletError::Bitcoin(format!("Invalid txid: {}", e)))?,
                    vout: utxo.output_index,
                },
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            });
        }

        tx.output.push(TxOut {
            value: Amount::from_sat(amount_sats),
            script_pubkey: to_address.script_pubkey(),
        });

        if change_amount > 0 {
            tx.output.push(TxOut {
                value: Amount::from_sat(change_amount),
                script_pubkey: change_address.script_pubkey(),
            });
        }

        Ok(tx)
    }

    /// Sign every P2PKH input with one key, using the FORKID digest
    pub fn sign_transaction(
        &self,
        mut tx: Transaction,
        utxos: &[UnspentOutput],
        private_key: &PrivateKey,
    ) -> Result<Transaction, WalletError> {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_private_key(&secp, private_key);
        let script_code = ScriptBuf::new_p2pkh(&public_key.pubkey_hash());

        let mut script_sigs = Vec::with_capacity(tx.input.len());

        for (input_index, input) in tx.input.iter().enumerate() {
            let utxo = utxos
                .iter()
                .find(|u| {
                    Txid::from_str(&u.transaction_id)
                        .map(|txid| {
                            txid == input.previous_output.txid
                                && u.output_index == input.previous_output.vout
                        })
                        .unwrap_or(false)
                })
                .ok_or_else(|| WalletError::Bitcoin("UTXO not found for input".into()))?;

            let sighash = forkid_sighash(
                &tx,
                input_index,
                &script_code,
                utxo.value_sats,
                SIGHASH_ALL_FORKID,
            )?;

            let message = Message::from_digest(sighash.to_byte_array());
            let signature = secp.sign_ecdsa(&message, &private_key.inner);

            let mut sig_with_hashtype = signature.serialize_der().to_vec();
            sig_with_hashtype.push(SIGHASH_ALL_FORKID as u8);

            let sig_push = PushBytesBuf::try_from(sig_with_hashtype)
                .map_err(|e| WalletError::Bitcoin(format!("Signature push: {}", e)))?;

            script_sigs.push(
                Builder::new()
                    .push_slice(sig_push)
                    .push_key(&public_key)
                    .into_script(),
            );
        }

        for (input, script_sig) in tx.input.iter_mut().zip(script_sigs) {
            input.script_sig = script_sig;
        }

        log::debug!(
            "Signed {} inputs for {} on {}",
            tx.input.len(),
            Address::p2pkh(public_key.pubkey_hash(), self.network),
            self.network
        );

        Ok(tx)
    }
}

/// BIP143-style signature digest used by BSV for every input type.
///
/// Only the SIGHASH_ALL base type without ANYONECANPAY is supported.
pub fn forkid_sighash(
    tx: &Transaction,
    input_index: usize,
    script_code: &ScriptBuf,
    value_sats: u64,
    sighash_type: u32,
) -> Result<sha256d::Hash, WalletError> {
    if sighash_type & SIGHASH_BASE_MASK != 0x01 || sighash_type & SIGHASH_ANYONECANPAY != 0 {
        return Err(WalletError::Bitcoin(format!(
            "Unsupported sighash type {:#x}",
            sighash_type
        )));
    }

    let input = tx.input.get(input_index).ok_or_else(|| {
        WalletError::Bitcoin(format!(
            "Input {} out of range ({} inputs)",
            input_index,
            tx.input.len()
        ))
    })?;

    let mut prevouts = Vec::with_capacity(tx.input.len() * 36);
    let mut sequences = Vec::with_capacity(tx.input.len() * 4);
    for txin in &tx.input {
        prevouts.extend(serialize(&txin.previous_output));
        sequences.extend(txin.sequence.0.to_le_bytes());
    }

    let mut outputs = Vec::new();
    for txout in &tx.output {
        outputs.extend(serialize(txout));
    }

    let hash_prevouts = sha256d::Hash::hash(&prevouts);
    let hash_sequence = sha256d::Hash::hash(&sequences);
    let hash_outputs = sha256d::Hash::hash(&outputs);

    let mut preimage = Vec::with_capacity(160 + script_code.len());
    preimage.extend(tx.version.0.to_le_bytes());
    preimage.extend(hash_prevouts.as_byte_array());
    preimage.extend(hash_sequence.as_byte_array());
    preimage.extend(serialize(&input.previous_output));
    preimage.extend(serialize(script_code));
    preimage.extend(value_sats.to_le_bytes());
    preimage.extend(input.sequence.0.to_le_bytes());
    preimage.extend(hash_outputs.as_byte_array());
    preimage.extend(tx.lock_time.to_consensus_u32().to_le_bytes());
    preimage.extend(sighash_type.to_le_bytes());

    Ok(sha256d::Hash::hash(&preimage))
}
