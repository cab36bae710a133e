//! Slack channel discovery.
//!
//! Messages are posted through the integration broker; this crate talks to
//! the Slack Web API directly only to list channels and verify bot tokens.

pub mod channels;
pub mod web;

pub use channels::ChannelDirectory;
pub use web::{SlackApi, SlackApiError, SlackWebClient};
