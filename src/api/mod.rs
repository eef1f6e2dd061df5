//! Salesforce API access.
//!
//! [`Platform`] is the boundary the load engine talks to; [`SalesforceClient`]
//! implements it over the REST, Apex SOAP and Bulk 2.0 APIs.

pub mod apex;
pub mod auth;
pub mod bulk;
pub mod client;
pub mod platform;
pub mod query;

pub use apex::ExecuteResult;
pub use auth::{Session, authenticate};
pub use bulk::{BulkJobOutcome, BulkJobState};
pub use client::SalesforceClient;
pub use platform::{FieldDefinition, Platform, PollSettings};
pub use query::{QueryResult, escape_soql, field_text, in_clause};
