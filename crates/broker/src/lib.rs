//! Channel dispatch through the integration broker.
//!
//! `client` holds the broker seam and its REST implementation. Each channel
//! module turns a composed message into a broker action and reads the result
//! back through `outcome::ActionOutcome`.

pub mod client;
pub mod connection;
pub mod gmail;
pub mod linkedin;
pub mod memory;
pub mod outcome;
pub mod slack;
pub mod whatsapp;

pub use client::{BrokerError, ComposioClient, IntegrationBroker};
pub use gmail::GmailService;
pub use linkedin::LinkedInService;
pub use outcome::{ActionOutcome, DispatchError};
pub use slack::SlackDispatchService;
pub use whatsapp::{WhatsAppPayload, WhatsAppService};
