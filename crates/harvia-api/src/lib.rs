//! Async client for the MyHarvia cloud backend.
//!
//! The backend is a set of AWS AppSync GraphQL services fronted by a Cognito
//! user pool. This crate covers the protocol plumbing:
//!
//! - **[`Session`]**: the pooled HTTP client, open between `open()` and `close()`.
//! - **[`EndpointDirectory`]**: the `users`, `device`, `events`, and `data`
//!   endpoints resolved once via `GET {base}/{service}/endpoint`.
//! - **[`CredentialManager`]**: sign-in and transparent token renewal behind
//!   the [`IdentityProvider`] capability, with [`CognitoProvider`] as the
//!   production implementation (SRP sign-in, refresh-token renewal).
//! - **[`HarviaClient::execute`]**: authenticated GraphQL POSTs returning the
//!   raw JSON envelope.

pub mod auth;
pub mod client;
pub mod cognito;
pub mod discovery;
pub mod error;
pub mod graphql;
pub mod transport;

pub use auth::{AuthContext, CredentialManager, CredentialState, IdentityProvider};
pub use client::{ClientConfig, HarviaClient};
pub use cognito::CognitoProvider;
pub use discovery::{EndpointDescriptor, EndpointDirectory, Service, UserPool};
pub use error::Error;
pub use graphql::GraphqlOperation;
pub use transport::{Session, TransportConfig};
