pub mod password;
pub mod token;

pub mod account_service;
pub mod account_service_impl;
pub use account_service::{
    AccountDraft, AccountError, AccountService, AccountUpdate, AuthOutcome,
};
pub use account_service_impl::SeaOrmAccountService;

pub mod email_service;
pub mod email_service_impl;
pub use email_service::{EmailError, EmailService};
pub use email_service_impl::{LogEmailService, SmtpEmailService};

pub mod identity;
pub use identity::{IdentityError, IdentityVerifier, VerifiedIdentity};
