use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DecodeError;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self { Self(Uuid::new_v4()) }

            pub fn from_uuid(uuid: Uuid) -> Self { Self(uuid) }

            pub fn as_uuid(&self) -> &Uuid { &self.0 }

            /// Last six characters of the hyphenated form, for log lines
            pub fn to_short(&self) -> String {
                let value = self.0.to_string();
                value[value.len() - 6..].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self { Self::new() }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if f.alternate() {
                    write!(f, "{}", self.to_short())
                } else {
                    write!(f, "{}", self.0)
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}({})", stringify!($name), self.to_short()) }
        }

        impl FromStr for $name {
            type Err = DecodeError;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self(Uuid::parse_str(s)?)) }
        }

        impl TryFrom<&str> for $name {
            type Error = DecodeError;
            fn try_from(id: &str) -> Result<Self, Self::Error> { id.parse() }
        }

        impl From<$name> for serde_json::Value {
            fn from(id: $name) -> Self { serde_json::Value::String(id.0.to_string()) }
        }
    };
}

row_id!(
    /// Primary key of a row in `storefronts`
    StorefrontId
);
row_id!(
    /// Primary key of a row in `storefront_categories`
    CategoryId
);
row_id!(
    /// Primary key of a row in `storefront_images`
    ImageId
);
