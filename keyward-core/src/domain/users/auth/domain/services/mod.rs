mod credential_lifecycle;

pub use credential_lifecycle::{
    AuthTokens, CredentialLifecycleService, RegisterCommand,
};
