//! Identity newtypes.
//!
//! Every identity is a v4 UUID allocated once at creation. Identities are
//! never reused, so a stray response value always names the item it was
//! entered against, even after that item is removed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! identity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

identity!(
    /// Identity of a [`TemplateDefinition`](crate::models::template::TemplateDefinition).
    TemplateId
);
identity!(
    /// Identity of a section within a template.
    SectionId
);
identity!(
    /// Identity of a single question/field.
    ItemId
);
identity!(
    /// Identity of one form instance being filled against a template.
    InstanceId
);
