//! API integration tests against the in-memory repository and loopback
//! protocol connections.

mod helpers;
mod message_test;
mod tenant_test;
mod webhook_test;
