pub mod account_models;
pub mod account_service;

pub use account_models::{
    AccountKind, Doctor, LoginForm, NewDoctor, NewUser, SessionIdentity, User,
};
pub use account_service::{AccountError, AccountService, AccountStore, SessionStore};
