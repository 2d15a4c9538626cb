mod token_auth_provider;

pub use token_auth_provider::{StaticAuthProvider, TokenAuthProvider};
