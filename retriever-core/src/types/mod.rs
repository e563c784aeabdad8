//! Domain types for the retriever.
//!
//! - [`SourceCode`]: Verified source record as served by the explorer API
//! - [`EtherscanResponse`]: Raw envelope around the source record
//! - [`ContractRecord`]: A persisted row for one contract address
//! - [`validate_address`]: Shape check for `0x`-prefixed addresses

mod address;
mod record;
mod source;

pub use address::*;
pub use record::*;
pub use source::*;
