use serde::{Deserialize, Serialize};

pub type Address = u32;

/// Hands out component addresses in registration order.
///
/// Addresses double as the deterministic iteration order of the system's
/// component table, so they must never be reused within one run.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AddressGenerator {
    curr: u32,
}

impl AddressGenerator {
    pub fn new() -> AddressGenerator {
        AddressGenerator { curr: 0 }
    }

    pub fn next(&mut self) -> Address {
        let addr = self.curr;

        self.curr += 1;

        addr
    }
}
