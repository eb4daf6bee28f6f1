use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::users::auth::PasswordCredential;
use crate::domain::users::value_objects::{Address, Email, PersonName, Phone, Role};

/// Account aggregate.
///
/// Every field is already a validated value, so an identity can only hold
/// valid data. The record store owns persistence; the core only reaches it
/// through the repository ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    id: Uuid,
    first_name: PersonName,
    last_name: PersonName,
    email: Email,
    phone: Phone,
    address: Address,
    credential: PasswordCredential,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

/// Validated inputs for a new account.
#[derive(Debug, Clone)]
pub struct NewUserIdentity {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
    pub phone: Phone,
    pub address: Address,
    pub credential: PasswordCredential,
    pub role: Role,
}

impl UserIdentity {
    pub fn new(input: NewUserIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            address: input.address,
            credential: input.credential,
            role: input.role,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// Rebuild an identity from persisted fields.
    #[allow(clippy::too_many_arguments)]
    pub fn hydrate(
        id: Uuid,
        first_name: PersonName,
        last_name: PersonName,
        email: Email,
        phone: Phone,
        address: Address,
        credential: PasswordCredential,
        role: Role,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        last_login_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            phone,
            address,
            credential,
            role,
            created_at,
            updated_at,
            last_login_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn first_name(&self) -> &PersonName {
        &self.first_name
    }

    pub fn last_name(&self) -> &PersonName {
        &self.last_name
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn phone(&self) -> &Phone {
        &self.phone
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn credential(&self) -> &PasswordCredential {
        &self.credential
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn update_name(
        &mut self,
        first_name: PersonName,
        last_name: PersonName,
    ) -> DateTime<Utc> {
        self.first_name = first_name;
        self.last_name = last_name;
        self.touch()
    }

    pub fn update_email(&mut self, email: Email) -> DateTime<Utc> {
        self.email = email;
        self.touch()
    }

    pub fn update_phone(&mut self, phone: Phone) -> DateTime<Utc> {
        self.phone = phone;
        self.touch()
    }

    pub fn update_address(&mut self, address: Address) -> DateTime<Utc> {
        self.address = address;
        self.touch()
    }

    pub fn set_role(&mut self, role: Role) -> DateTime<Utc> {
        self.role = role;
        self.touch()
    }

    /// Swap in a new credential. The old one is dropped, never edited.
    pub fn replace_credential(
        &mut self,
        credential: PasswordCredential,
    ) -> DateTime<Utc> {
        self.credential = credential;
        self.touch()
    }

    pub fn record_login(&mut self) -> DateTime<Utc> {
        let now = self.touch();
        self.last_login_at = Some(now);
        now
    }

    fn touch(&mut self) -> DateTime<Utc> {
        // Never move backwards, even if the wall clock does.
        self.updated_at = Utc::now().max(self.updated_at);
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::users::auth::{HasherSettings, PasswordHasher};

    fn sample() -> UserIdentity {
        let hasher = PasswordHasher::new(HasherSettings::pbkdf2(1_000)).unwrap();
        UserIdentity::new(NewUserIdentity {
            first_name: PersonName::parse("first_name", "Ada").unwrap(),
            last_name: PersonName::parse("last_name", "Lovelace").unwrap(),
            email: Email::parse("Ada@Example.com").unwrap(),
            phone: Phone::parse("+442071234567").unwrap(),
            address: Address::new("12 St James's Square", "London", "SW1Y 4JH", "UK")
                .unwrap(),
            credential: hasher.hash_raw("Password@123").unwrap(),
            role: Role::USER,
        })
    }

    #[test]
    fn new_identity_starts_without_login() {
        let user = sample();
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert_eq!(user.email().as_str(), "ada@example.com");
        assert_eq!(user.created_at(), user.updated_at());
        assert!(user.last_login_at().is_none());
        assert_eq!(user.id().get_version_num(), 7);
    }

    #[test]
    fn mutators_bump_updated_at() {
        let mut user = sample();
        let created = user.created_at();

        let stamp = user.set_role(Role::ADMIN);
        assert_eq!(stamp, user.updated_at());
        assert!(stamp >= created);
        assert!(user.role().is_admin());

        let login = user.record_login();
        assert_eq!(user.last_login_at(), Some(login));
    }

    #[test]
    fn replace_credential_swaps_wholesale() {
        let mut user = sample();
        let hasher = PasswordHasher::new(HasherSettings::pbkdf2(1_000)).unwrap();
        let before = user.credential().clone();

        user.replace_credential(hasher.hash_raw("Another#Pass9").unwrap());
        assert_ne!(user.credential(), &before);
        assert!(hasher.verify("Another#Pass9", user.credential()));
        assert!(!hasher.verify("Password@123", user.credential()));
    }
}
