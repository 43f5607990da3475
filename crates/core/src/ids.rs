use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Identifier of a user role assignment.
    AssignmentId
}

uuid_id! {
    /// Identifier of a role permission profile.
    ProfileId
}

uuid_id! {
    /// Identifier of a single permission record.
    RecordId
}

#[cfg(test)]
mod tests {
    use super::{AssignmentId, RecordId};

    #[test]
    fn identifiers_format_as_uuid() {
        let id = AssignmentId::new();
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn identifiers_are_distinct() {
        assert_ne!(RecordId::new(), RecordId::new());
    }
}
