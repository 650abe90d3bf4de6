use crate::error::TxError;
use crate::fees::Eip1559Fees;
use crate::rlp::RlpList;
use chainvault_crypto::hash::keccak256;
use chainvault_crypto::Secp256k1Keypair;
use chainvault_types::EvmAddress;

/// EIP-2718 type byte of EIP-1559 transactions
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// `transfer(address,uint256)` selector
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Access list entry for warm storage slots
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AccessListEntry {
    pub address: EvmAddress,
    pub storage_keys: Vec<[u8; 32]>,
}

/// Unsigned EIP-1559 (type 2) transaction.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Eip1559Transaction {
    /// Chain ID (replay protection)
    pub chain_id: u64,
    /// Sender's nonce
    pub nonce: u64,
    /// Maximum priority fee per gas (tip)
    pub max_priority_fee_per_gas: u128,
    /// Maximum total fee per gas (base + priority)
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    /// Recipient address (None = contract creation)
    pub to: Option<EvmAddress>,
    /// Value in wei
    pub value: u128,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessListEntry>,
}

/// Signed transaction ready for `eth_sendRawTransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedEvmTransaction {
    pub raw: Vec<u8>,
    pub hash: [u8; 32],
}

impl SignedEvmTransaction {
    fn from_raw(raw: Vec<u8>) -> Self {
        let hash = keccak256(&raw);
        Self { raw, hash }
    }

    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

impl Eip1559Transaction {
    /// Native-asset transfer
    pub fn transfer(chain_id: u64, nonce: u64, to: EvmAddress, value: u128, gas_limit: u64, fees: Eip1559Fees) -> Self {
        Self {
            chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit,
            to: Some(to),
            value,
            data: Vec::new(),
            access_list: Vec::new(),
        }
    }

    /// ERC-20 `transfer` call on `token`
    pub fn erc20_transfer(
        chain_id: u64,
        nonce: u64,
        token: EvmAddress,
        recipient: &EvmAddress,
        amount: u128,
        gas_limit: u64,
        fees: Eip1559Fees,
    ) -> Self {
        Self::transfer(chain_id, nonce, token, 0, gas_limit, fees)
            .with_data(erc20_transfer_data(recipient, amount))
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_access_list(mut self, access_list: Vec<AccessListEntry>) -> Self {
        self.access_list = access_list;
        self
    }

    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    fn append_unsigned_fields(&self, list: &mut RlpList) {
        list.uint(self.chain_id as u128)
            .uint(self.nonce as u128)
            .uint(self.max_priority_fee_per_gas)
            .uint(self.max_fee_per_gas)
            .uint(self.gas_limit as u128);
        match &self.to {
            Some(to) => list.bytes(to.as_bytes()),
            None => list.bytes(&[]),
        };
        list.uint(self.value)
            .bytes(&self.data)
            .raw(&encode_access_list(&self.access_list));
    }

    /// `0x02 || rlp([chain_id, nonce, max_priority_fee, max_fee, gas, to, value, data, access_list])`
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut list = RlpList::new();
        self.append_unsigned_fields(&mut list);
        typed(list.finish())
    }

    /// Compute the hash that should be signed
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    pub fn sign(&self, keypair: &Secp256k1Keypair) -> Result<SignedEvmTransaction, TxError> {
        let sig = keypair.sign_prehash(&self.signing_hash())?;
        let mut list = RlpList::new();
        self.append_unsigned_fields(&mut list);
        list.uint(sig.recovery_id as u128)
            .uint_bytes(&sig.r)
            .uint_bytes(&sig.s);
        let signed = SignedEvmTransaction::from_raw(typed(list.finish()));
        tracing::debug!(hash = %signed.hash_hex(), nonce = self.nonce, "Signed EIP-1559 transaction");
        Ok(signed)
    }

    /// Maximum possible cost: `value + gas_limit * max_fee_per_gas`
    pub fn max_cost(&self) -> Option<u128> {
        (self.gas_limit as u128)
            .checked_mul(self.max_fee_per_gas)?
            .checked_add(self.value)
    }
}

/// Pre-London transaction with EIP-155 replay protection, for networks
/// that do not support type-2 transactions.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Option<EvmAddress>,
    pub value: u128,
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    fn append_base_fields(&self, list: &mut RlpList) {
        list.uint(self.nonce as u128)
            .uint(self.gas_price)
            .uint(self.gas_limit as u128);
        match &self.to {
            Some(to) => list.bytes(to.as_bytes()),
            None => list.bytes(&[]),
        };
        list.uint(self.value).bytes(&self.data);
    }

    /// `rlp([nonce, gas_price, gas, to, value, data, chain_id, 0, 0])`
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut list = RlpList::new();
        self.append_base_fields(&mut list);
        list.uint(self.chain_id as u128).uint(0).uint(0);
        list.finish()
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    pub fn sign(&self, keypair: &Secp256k1Keypair) -> Result<SignedEvmTransaction, TxError> {
        let sig = keypair.sign_prehash(&self.signing_hash())?;
        let v = (self.chain_id as u128)
            .checked_mul(2)
            .and_then(|x| x.checked_add(35 + sig.recovery_id as u128))
            .ok_or(TxError::Overflow("EIP-155 v"))?;
        let mut list = RlpList::new();
        self.append_base_fields(&mut list);
        list.uint(v).uint_bytes(&sig.r).uint_bytes(&sig.s);
        Ok(SignedEvmTransaction::from_raw(list.finish()))
    }
}

/// ABI-encoded `transfer(recipient, amount)` call data.
pub fn erc20_transfer_data(recipient: &EvmAddress, amount: u128) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&ERC20_TRANSFER_SELECTOR);
    data.extend_from_slice(&abi_address(recipient.as_bytes()));
    data.extend_from_slice(&abi_uint(amount));
    data
}

/// Left-pad a 20-byte address to a 32-byte ABI word
pub fn abi_address(addr: &[u8; 20]) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(addr);
    word
}

pub fn abi_uint(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn encode_access_list(entries: &[AccessListEntry]) -> Vec<u8> {
    let mut list = RlpList::new();
    for entry in entries {
        let mut keys = RlpList::new();
        for key in &entry.storage_keys {
            keys.bytes(key);
        }
        let mut item = RlpList::new();
        item.bytes(entry.address.as_bytes()).raw(&keys.finish());
        list.raw(&item.finish());
    }
    list.finish()
}

fn typed(rlp: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(rlp.len() + 1);
    out.push(EIP1559_TX_TYPE);
    out.extend(rlp);
    out
}
