//! Ethereum value primitives: hex codec, Keccak-256, addresses, contract
//! address derivation, and the quantity/data/block-parameter encodings used
//! inside JSON-RPC payloads.

pub mod address;
pub mod block;
pub mod create2;
pub mod data;
pub mod error;
pub mod hex;
pub mod keccak;
pub mod quantity;

pub use address::{EthereumAddress, ADDRESS_SIZE};
pub use block::BlockParameter;
pub use create2::{derive_create, derive_create2, derive_create2_from_init_code};
pub use data::Data;
pub use error::EncodingError;
pub use keccak::{keccak256, keccak256_concat, Hash32, HASH_SIZE};
pub use quantity::Quantity;
