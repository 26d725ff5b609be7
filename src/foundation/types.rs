use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Zero is the "unset" sentinel; store-generated ids start at 1.
            pub const fn is_unset(&self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id_type!(
    /// Reference to a resident record owned by the surrounding application.
    ResidentId
);
define_id_type!(
    /// Reference to a row in the certificate type catalog.
    CertificateTypeId
);
define_id_type!(
    /// Store-generated identifier of an issued certificate.
    CertificateId
);
