//! Deterministic contract address derivation for the CREATE and CREATE2
//! schemes. All functions are pure: identical inputs always yield the same
//! address.

use super::address::{EthereumAddress, ADDRESS_SIZE};
use super::error::EncodingError;
use super::keccak::{keccak256, keccak256_concat, HASH_SIZE};
use rlp::RlpStream;

const CREATE2_PREFIX: u8 = 0xff;
const SALT_SIZE: usize = 32;

/// Computes a CREATE2 address from a precomputed init code hash.
///
/// `keccak256(0xff ++ deployer ++ salt ++ init_code_hash)[12..32]`
pub fn derive_create2(
    deployer: &EthereumAddress,
    salt: &[u8],
    init_code_hash: &[u8],
) -> Result<EthereumAddress, EncodingError> {
    if salt.len() != SALT_SIZE {
        return Err(EncodingError::InvalidSaltLength(salt.len()));
    }
    if init_code_hash.len() != HASH_SIZE {
        return Err(EncodingError::InvalidInitCodeHashLength(
            init_code_hash.len(),
        ));
    }

    let hash = keccak256_concat(&[
        &[CREATE2_PREFIX],
        deployer.as_bytes(),
        salt,
        init_code_hash,
    ]);
    EthereumAddress::from_slice(&hash.as_bytes()[HASH_SIZE - ADDRESS_SIZE..])
}

/// Hashes `init_code` and derives the CREATE2 address from it. Only the salt
/// length can fail; empty init code is valid.
pub fn derive_create2_from_init_code(
    deployer: &EthereumAddress,
    salt: &[u8],
    init_code: &[u8],
) -> Result<EthereumAddress, EncodingError> {
    let init_code_hash = keccak256(init_code);
    derive_create2(deployer, salt, init_code_hash.as_bytes())
}

/// Computes the address of a contract deployed with CREATE by `deployer` at
/// account nonce `nonce`: `keccak256(rlp([deployer, nonce]))[12..32]`.
pub fn derive_create(deployer: &EthereumAddress, nonce: u64) -> EthereumAddress {
    let mut stream = RlpStream::new_list(2);
    stream.append(&deployer.as_bytes());
    stream.append(&nonce);
    let hash = keccak256(stream.out());

    let mut bytes = [0u8; ADDRESS_SIZE];
    bytes.copy_from_slice(&hash.as_bytes()[HASH_SIZE - ADDRESS_SIZE..]);
    EthereumAddress::new(bytes)
}
