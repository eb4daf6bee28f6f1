// Account value objects.
// Each type validates once, at construction, and is immutable afterwards;
// downstream code never re-checks them.

mod address;
mod email;
mod password;
mod person_name;
mod phone;
mod role;
mod validation;

pub use address::Address;
pub use email::{EMAIL_MATCH_BUDGET, Email};
pub use password::{PASSWORD_SPECIAL_CHARACTERS, PasswordRule, RawPassword};
pub use person_name::PersonName;
pub use phone::Phone;
pub use role::Role;
pub use validation::{ValidationError, ValidationReason};
