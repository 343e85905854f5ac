pub mod client;
pub mod credentials;

pub use client::{DarajaClient, StkGateway, StkPushAcceptance, StkQueryOutcome};
pub use credentials::{AccessToken, CredentialCache, DarajaTokenExchanger, TokenExchanger};
