pub mod models;
pub mod services;

pub use services::{
    AccessToken, CredentialCache, DarajaClient, DarajaTokenExchanger, StkGateway,
    StkPushAcceptance, StkQueryOutcome, TokenExchanger,
};
