use ethers::types::Address;
use log::debug;
use std::str::FromStr;

use crate::networks::AddressFamily;

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

// SS58 encodings of 32-byte account ids with one or two prefix bytes.
const SS58_MIN_LEN: usize = 47;
const SS58_MAX_LEN: usize = 49;

/// Wallet addresses split by the family each network can query with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoutedAddresses {
    pub account: Vec<String>,
    pub contract: Vec<String>,
}

impl RoutedAddresses {
    pub fn for_family(&self, family: AddressFamily) -> &[String] {
        match family {
            AddressFamily::Account => &self.account,
            AddressFamily::Contract => &self.contract,
        }
    }
}

/// Partitions addresses into account-based and contract-style lists.
///
/// Input order is kept within each list. Addresses matching neither format
/// are dropped.
pub fn route_addresses(addresses: &[String]) -> RoutedAddresses {
    let mut routed = RoutedAddresses::default();

    for address in addresses {
        match classify_address(address) {
            Some(AddressFamily::Contract) => routed.contract.push(address.clone()),
            Some(AddressFamily::Account) => routed.account.push(address.clone()),
            None => debug!("Dropping unrecognised address {}", address),
        }
    }

    routed
}

pub fn classify_address(address: &str) -> Option<AddressFamily> {
    if is_evm_address(address) {
        Some(AddressFamily::Contract)
    } else if is_ss58_address(address) {
        Some(AddressFamily::Account)
    } else {
        None
    }
}

pub fn is_evm_address(address: &str) -> bool {
    address.len() == 42 && address.starts_with("0x") && Address::from_str(address).is_ok()
}

pub fn is_ss58_address(address: &str) -> bool {
    (SS58_MIN_LEN..=SS58_MAX_LEN).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}
