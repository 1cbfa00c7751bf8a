use alloy::primitives::{Address, B256, U256, address};
use alloy::rpc::types::eth::Filter;
use alloy_sol_types::{SolCall, SolEvent, sol};

use crate::rpc::Error;

sol! {
    contract SimpleStorage {
        function getValue() external view returns (uint256);

        function setValue(uint256 _value) external;

        event ValueUpdated(uint256 newValue);
    }
}

/// Chain ID of the Avalanche Fuji test network.
pub const AVALANCHE_FUJI_CHAIN_ID: u64 = 43113;

/// Human-readable name of the expected network.
pub const AVALANCHE_FUJI_NAME: &str = "Avalanche Fuji Testnet";

/// Public C-Chain RPC endpoint of Avalanche Fuji.
pub const FUJI_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";

/// Address of the tutorial `SimpleStorage` deployment on Fuji.
pub const DEFAULT_CONTRACT_ADDRESS: Address =
    address!("0x4bb0e13161abfbbb95b6c93effb4b20759c1b474");

/// Calldata for `getValue()`.
pub fn get_value_calldata() -> Vec<u8> {
    SimpleStorage::getValueCall {}.abi_encode()
}

/// Calldata for `setValue(uint256)`.
pub fn set_value_calldata(value: U256) -> Vec<u8> {
    SimpleStorage::setValueCall { _value: value }.abi_encode()
}

/// Decodes the return data of `getValue()`.
pub fn decode_value(data: &[u8]) -> Result<U256, Error> {
    SimpleStorage::getValueCall::abi_decode_returns(data)
        .map_err(|e| Error::DecodeError(format!("getValue returned malformed data: {e}")))
}

/// Topic of the `ValueUpdated(uint256)` event.
pub fn value_updated_topic() -> B256 {
    SimpleStorage::ValueUpdated::SIGNATURE_HASH
}

/// Log filter for `ValueUpdated` events of `contract` in the inclusive block range.
pub fn value_updated_filter(contract: Address, from_block: u64, to_block: u64) -> Filter {
    Filter::new()
        .address(contract)
        .event_signature(value_updated_topic())
        .from_block(from_block)
        .to_block(to_block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::hex;

    #[test]
    fn test_function_selectors() {
        assert_eq!(hex::encode(get_value_calldata()), "20965255");

        let calldata = set_value_calldata(U256::from(42));
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(hex::encode(&calldata[..4]), "55241077");
        assert_eq!(calldata[35], 42);
    }

    #[test]
    fn test_decode_value() {
        let encoded = U256::from(1234567u64).to_be_bytes::<32>();
        assert_eq!(decode_value(&encoded).unwrap(), U256::from(1234567u64));
    }

    #[test]
    fn test_decode_value_rejects_short_data() {
        assert!(matches!(decode_value(&[0u8; 5]), Err(Error::DecodeError(_))));
    }

    #[test]
    fn test_value_updated_filter_range() {
        let filter = value_updated_filter(DEFAULT_CONTRACT_ADDRESS, 100, 200);
        assert_eq!(filter.get_from_block(), Some(100));
        assert_eq!(filter.get_to_block(), Some(200));
    }
}
