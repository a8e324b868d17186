use crate::errors::{AppError, Result};
use ethers::types::Address;
use std::collections::HashMap;

/// Next nonce per sender, owned by one pipeline instance.
///
/// A nonce is only advanced by [`NonceBook::confirm`], which callers invoke after a
/// receipt for the transaction carrying that nonce has been observed.
#[derive(Debug, Default, Clone)]
pub struct NonceBook {
    next: HashMap<Address, u64>,
}

impl NonceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) tracking `address` from an on-chain pending count.
    pub fn seed(&mut self, address: Address, pending_count: u64) {
        self.next.insert(address, pending_count);
    }

    /// Nonce the next transaction from `address` must use.
    pub fn current(&self, address: Address) -> Result<u64> {
        self.next
            .get(&address)
            .copied()
            .ok_or_else(|| AppError::Other(format!("nonce for {address:?} was never seeded")))
    }

    /// Record that the transaction using the current nonce was mined.
    pub fn confirm(&mut self, address: Address) -> Result<u64> {
        let slot = self
            .next
            .get_mut(&address)
            .ok_or_else(|| AppError::Other(format!("nonce for {address:?} was never seeded")))?;
        *slot += 1;
        Ok(*slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseeded_address_is_an_error() {
        let book = NonceBook::new();
        assert!(book.current(Address::zero()).is_err());
    }

    #[test]
    fn confirm_advances_by_one() {
        let mut book = NonceBook::new();
        let a = Address::repeat_byte(1);
        book.seed(a, 7);
        assert_eq!(book.current(a).unwrap(), 7);
        // reading does not consume
        assert_eq!(book.current(a).unwrap(), 7);
        assert_eq!(book.confirm(a).unwrap(), 8);
        assert_eq!(book.current(a).unwrap(), 8);
    }

    #[test]
    fn addresses_are_tracked_independently() {
        let mut book = NonceBook::new();
        let (a, b) = (Address::repeat_byte(1), Address::repeat_byte(2));
        book.seed(a, 0);
        book.seed(b, 40);
        book.confirm(a).unwrap();
        assert_eq!(book.current(a).unwrap(), 1);
        assert_eq!(book.current(b).unwrap(), 40);
    }

    #[test]
    fn reseed_overrides_local_count() {
        let mut book = NonceBook::new();
        let a = Address::repeat_byte(3);
        book.seed(a, 2);
        book.confirm(a).unwrap();
        book.seed(a, 10);
        assert_eq!(book.current(a).unwrap(), 10);
    }
}
