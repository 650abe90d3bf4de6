//! Solana instructions, program-derived addresses and legacy messages.

use crate::error::TxError;
use crate::fees::SolanaFeeParams;
use base64::Engine;
use chainvault_crypto::hash::sha256_multi;
use chainvault_crypto::Ed25519Keypair;
use chainvault_types::SolanaAddress;
use curve25519_dalek::edwards::CompressedEdwardsY;

/// `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: SolanaAddress = SolanaAddress::from_bytes([0u8; 32]);

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: SolanaAddress = SolanaAddress::from_bytes([
    6, 221, 246, 225, 215, 101, 161, 147, 217, 203, 225, 70, 206, 235, 121, 172, 28, 180, 133,
    237, 95, 91, 55, 145, 58, 140, 245, 133, 126, 255, 0, 169,
]);

/// `TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb`
pub const TOKEN_2022_PROGRAM_ID: SolanaAddress = SolanaAddress::from_bytes([
    6, 221, 246, 225, 238, 117, 143, 222, 24, 66, 93, 188, 228, 108, 205, 218, 182, 26, 252, 77,
    131, 185, 13, 39, 254, 189, 249, 40, 216, 161, 139, 252,
]);

/// `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: SolanaAddress = SolanaAddress::from_bytes([
    140, 151, 37, 143, 78, 36, 137, 241, 187, 61, 16, 41, 20, 142, 13, 131, 11, 90, 19, 153, 218,
    255, 16, 132, 4, 142, 123, 216, 219, 233, 248, 89,
]);

/// `ComputeBudget111111111111111111111111111111`
pub const COMPUTE_BUDGET_PROGRAM_ID: SolanaAddress = SolanaAddress::from_bytes([
    3, 6, 70, 111, 229, 33, 23, 50, 255, 236, 173, 186, 114, 195, 155, 231, 188, 140, 229, 187,
    197, 247, 18, 107, 44, 67, 155, 58, 64, 0, 0, 0,
]);

pub const MAX_SEED_LEN: usize = 32;
pub const MAX_SEEDS: usize = 16;
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

const SYSTEM_TRANSFER: u32 = 2;
const TOKEN_TRANSFER_CHECKED: u8 = 12;
const ATA_CREATE_IDEMPOTENT: u8 = 1;
const COMPUTE_SET_UNIT_LIMIT: u8 = 2;
const COMPUTE_SET_UNIT_PRICE: u8 = 3;

/// Account referenced by an instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: SolanaAddress,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: SolanaAddress, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: true }
    }

    pub fn new_readonly(pubkey: SolanaAddress, is_signer: bool) -> Self {
        Self { pubkey, is_signer, is_writable: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: SolanaAddress,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Append the compact-u16 ("shortvec") encoding of `value`.
pub fn encode_compact_u16(value: u16, out: &mut Vec<u8>) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

fn compact_len(len: usize, what: &'static str, out: &mut Vec<u8>) -> Result<(), TxError> {
    let len = u16::try_from(len).map_err(|_| TxError::Overflow(what))?;
    encode_compact_u16(len, out);
    Ok(())
}

pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// `sha256(seeds || program_id || "ProgramDerivedAddress")`, rejected when
/// the hash lands on the ed25519 curve.
pub fn create_program_address(seeds: &[&[u8]], program_id: &SolanaAddress) -> Result<SolanaAddress, TxError> {
    if seeds.len() > MAX_SEEDS {
        return Err(TxError::InvalidTransaction(format!("too many seeds: {}", seeds.len())));
    }
    let mut parts: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 2);
    for seed in seeds {
        if seed.len() > MAX_SEED_LEN {
            return Err(TxError::SeedTooLong(seed.len()));
        }
        parts.push(seed);
    }
    parts.push(program_id.as_bytes());
    parts.push(PDA_MARKER);
    let hash = sha256_multi(&parts);
    if is_on_curve(&hash) {
        return Err(TxError::NoProgramAddress);
    }
    Ok(SolanaAddress::from_bytes(hash))
}

/// Search bump seeds from 255 down for the first off-curve address.
pub fn find_program_address(seeds: &[&[u8]], program_id: &SolanaAddress) -> Result<(SolanaAddress, u8), TxError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(TxError::InvalidTransaction(format!("too many seeds: {}", seeds.len())));
    }
    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(TxError::NoProgramAddress) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(TxError::NoProgramAddress)
}

/// Canonical token account of `wallet` for `mint`.
pub fn associated_token_address(
    wallet: &SolanaAddress,
    mint: &SolanaAddress,
    token_program: &SolanaAddress,
) -> Result<SolanaAddress, TxError> {
    let (address, _) = find_program_address(
        &[&wallet.as_bytes()[..], &token_program.as_bytes()[..], &mint.as_bytes()[..]],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )?;
    Ok(address)
}

pub fn system_transfer(from: &SolanaAddress, to: &SolanaAddress, lamports: u64) -> Instruction {
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    }
}

/// `CreateIdempotent`: succeeds when the account already exists.
pub fn create_associated_token_account_idempotent(
    payer: &SolanaAddress,
    wallet: &SolanaAddress,
    mint: &SolanaAddress,
    token_program: &SolanaAddress,
) -> Result<Instruction, TxError> {
    let ata = associated_token_address(wallet, mint, token_program)?;
    Ok(Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(ata, false),
            AccountMeta::new_readonly(*wallet, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(*token_program, false),
        ],
        data: vec![ATA_CREATE_IDEMPOTENT],
    })
}

pub fn transfer_checked(
    token_program: &SolanaAddress,
    source: &SolanaAddress,
    mint: &SolanaAddress,
    destination: &SolanaAddress,
    owner: &SolanaAddress,
    amount: u64,
    decimals: u8,
) -> Instruction {
    let mut data = Vec::with_capacity(10);
    data.push(TOKEN_TRANSFER_CHECKED);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);
    Instruction {
        program_id: *token_program,
        accounts: vec![
            AccountMeta::new(*source, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new(*destination, false),
            AccountMeta::new_readonly(*owner, true),
        ],
        data,
    }
}

pub fn set_compute_unit_limit(units: u32) -> Instruction {
    let mut data = vec![COMPUTE_SET_UNIT_LIMIT];
    data.extend_from_slice(&units.to_le_bytes());
    Instruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: Vec::new(),
        data,
    }
}

pub fn set_compute_unit_price(micro_lamports: u64) -> Instruction {
    let mut data = vec![COMPUTE_SET_UNIT_PRICE];
    data.extend_from_slice(&micro_lamports.to_le_bytes());
    Instruction {
        program_id: COMPUTE_BUDGET_PROGRAM_ID,
        accounts: Vec::new(),
        data,
    }
}

/// Optional priority fee attached to a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputeBudget {
    pub unit_limit: u32,
    pub unit_price_micro_lamports: u64,
}

impl ComputeBudget {
    fn instructions(&self) -> [Instruction; 2] {
        [
            set_compute_unit_limit(self.unit_limit),
            set_compute_unit_price(self.unit_price_micro_lamports),
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// Legacy (unversioned) transaction message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<SolanaAddress>,
    pub recent_blockhash: [u8; 32],
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Compile instructions with `payer` as fee payer.
    ///
    /// Keys are ordered writable signers, readonly signers, writable
    /// non-signers, readonly non-signers; within a group by first
    /// appearance. The payer is always key 0.
    pub fn new(instructions: &[Instruction], payer: &SolanaAddress, recent_blockhash: [u8; 32]) -> Result<Self, TxError> {
        let mut metas: Vec<AccountMeta> = vec![AccountMeta::new(*payer, true)];
        let mut merge = |meta: AccountMeta| {
            match metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
                Some(existing) => {
                    existing.is_signer |= meta.is_signer;
                    existing.is_writable |= meta.is_writable;
                }
                None => metas.push(meta),
            }
        };
        for ix in instructions {
            for meta in &ix.accounts {
                merge(*meta);
            }
            merge(AccountMeta::new_readonly(ix.program_id, false));
        }

        let group = |signer: bool, writable: bool| {
            metas
                .iter()
                .filter(move |m| m.is_signer == signer && m.is_writable == writable)
                .map(|m| m.pubkey)
        };
        let account_keys: Vec<SolanaAddress> = group(true, true)
            .chain(group(true, false))
            .chain(group(false, true))
            .chain(group(false, false))
            .collect();
        if account_keys.len() > u8::MAX as usize {
            return Err(TxError::TooManyAccounts(account_keys.len()));
        }

        let count = |signer: bool, writable: bool| group(signer, writable).count() as u8;
        let header = MessageHeader {
            num_required_signatures: count(true, true) + count(true, false),
            num_readonly_signed_accounts: count(true, false),
            num_readonly_unsigned_accounts: count(false, false),
        };

        let index_of = |key: &SolanaAddress| -> Result<u8, TxError> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| TxError::InvalidTransaction(format!("account {} not compiled", key)))
        };
        let compiled = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|m| index_of(&m.pubkey))
                        .collect::<Result<_, TxError>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, TxError>>()?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    pub fn fee_payer(&self) -> Option<&SolanaAddress> {
        self.account_keys.first()
    }

    pub fn signer_keys(&self) -> &[SolanaAddress] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let signers = self.header.num_required_signatures as usize;
        if index < signers {
            index < signers - self.header.num_readonly_signed_accounts as usize
        } else {
            index < self.account_keys.len() - self.header.num_readonly_unsigned_accounts as usize
        }
    }

    /// Wire encoding of the message, the bytes that get signed.
    pub fn serialize(&self) -> Result<Vec<u8>, TxError> {
        let mut out = vec![
            self.header.num_required_signatures,
            self.header.num_readonly_signed_accounts,
            self.header.num_readonly_unsigned_accounts,
        ];
        compact_len(self.account_keys.len(), "account keys", &mut out)?;
        for key in &self.account_keys {
            out.extend_from_slice(key.as_bytes());
        }
        out.extend_from_slice(&self.recent_blockhash);
        compact_len(self.instructions.len(), "instructions", &mut out)?;
        for ix in &self.instructions {
            out.push(ix.program_id_index);
            compact_len(ix.accounts.len(), "instruction accounts", &mut out)?;
            out.extend_from_slice(&ix.accounts);
            compact_len(ix.data.len(), "instruction data", &mut out)?;
            out.extend_from_slice(&ix.data);
        }
        Ok(out)
    }

    /// Sign with every required signer. Signatures are ordered like the
    /// signer keys.
    pub fn sign(&self, signers: &[&Ed25519Keypair]) -> Result<SignedSolanaTransaction, TxError> {
        let message = self.serialize()?;
        let signatures = self
            .signer_keys()
            .iter()
            .map(|key| {
                signers
                    .iter()
                    .find(|kp| kp.address() == *key)
                    .map(|kp| kp.sign(&message))
                    .ok_or_else(|| TxError::MissingSigner(key.to_string()))
            })
            .collect::<Result<Vec<_>, TxError>>()?;
        let signed = SignedSolanaTransaction { signatures, message };
        tracing::debug!(signature = %signed.signature(), "Signed Solana transaction");
        Ok(signed)
    }
}

/// Signatures plus the signed message bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedSolanaTransaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: Vec<u8>,
}

impl SignedSolanaTransaction {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + self.signatures.len() * 64 + self.message.len());
        // signature count never exceeds the u8 header field
        encode_compact_u16(self.signatures.len() as u16, &mut out);
        for sig in &self.signatures {
            out.extend_from_slice(sig);
        }
        out.extend_from_slice(&self.message);
        out
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_bytes()).into_string()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_bytes())
    }

    /// First signature in base58, the transaction id
    pub fn signature(&self) -> String {
        self.signatures
            .first()
            .map(|s| bs58::encode(s).into_string())
            .unwrap_or_default()
    }
}

/// Decode a base58 blockhash as returned by `getLatestBlockhash`.
pub fn parse_blockhash(s: &str) -> Result<[u8; 32], TxError> {
    let bytes = bs58::decode(s.trim())
        .into_vec()
        .map_err(|e| TxError::InvalidTransaction(format!("invalid blockhash: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| TxError::InvalidTransaction("blockhash must be 32 bytes".to_string()))
}

/// Native SOL transfer message.
pub fn build_sol_transfer(
    from: &SolanaAddress,
    to: &SolanaAddress,
    lamports: u64,
    recent_blockhash: [u8; 32],
    compute: Option<ComputeBudget>,
) -> Result<Message, TxError> {
    if lamports == 0 {
        return Err(TxError::ZeroAmount);
    }
    let mut instructions = Vec::new();
    if let Some(budget) = compute {
        instructions.extend(budget.instructions());
    }
    instructions.push(system_transfer(from, to, lamports));
    Message::new(&instructions, from, recent_blockhash)
}

/// SPL token transfer between the associated token accounts of `owner`
/// and `recipient`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplTransfer {
    pub owner: SolanaAddress,
    pub recipient: SolanaAddress,
    pub mint: SolanaAddress,
    pub token_program: SolanaAddress,
    pub amount: u64,
    pub decimals: u8,
    /// Prepend an idempotent ATA creation for the recipient
    pub create_recipient_account: bool,
    pub recent_blockhash: [u8; 32],
    pub compute: Option<ComputeBudget>,
}

impl SplTransfer {
    pub fn fee_params(&self) -> SolanaFeeParams {
        SolanaFeeParams {
            signatures: 1,
            creates_token_account: self.create_recipient_account,
            compute_unit_limit: self.compute.map(|c| c.unit_limit).unwrap_or(0),
            compute_unit_price_micro_lamports: self.compute.map(|c| c.unit_price_micro_lamports).unwrap_or(0),
        }
    }

    pub fn build(&self) -> Result<Message, TxError> {
        if self.amount == 0 {
            return Err(TxError::ZeroAmount);
        }
        let source = associated_token_address(&self.owner, &self.mint, &self.token_program)?;
        let destination = associated_token_address(&self.recipient, &self.mint, &self.token_program)?;

        let mut instructions = Vec::new();
        if let Some(budget) = self.compute {
            instructions.extend(budget.instructions());
        }
        if self.create_recipient_account {
            instructions.push(create_associated_token_account_idempotent(
                &self.owner,
                &self.recipient,
                &self.mint,
                &self.token_program,
            )?);
        }
        instructions.push(transfer_checked(
            &self.token_program,
            &source,
            &self.mint,
            &destination,
            &self.owner,
            self.amount,
            self.decimals,
        ));
        Message::new(&instructions, &self.owner, self.recent_blockhash)
    }
}
