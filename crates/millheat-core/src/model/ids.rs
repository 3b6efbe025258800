// ── Vendor identity types ──
//
// Homes, rooms and devices are all keyed by 64-bit vendor ids. Separate
// newtypes keep a room id from being passed where a device id belongs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! vendor_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

vendor_id!(
    /// Identifier of a home (top level of the vendor tree).
    HomeId
);
vendor_id!(
    /// Identifier of a room within a home.
    RoomId
);
vendor_id!(
    /// Identifier of a heater. Also the bus address of its facts.
    DeviceId
);
