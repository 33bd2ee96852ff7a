// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between a field client and the remote store.
//!
//! Every client request carries an `id` that the server echoes back, so the
//! client can match responses to requests on a shared connection:
//! - `probe` is a cheap existence query used as a reachability preflight
//! - `whoami` resolves a session token to the tenant it belongs to
//! - `upsert` writes one record, idempotent on the category's natural key

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::op::Payload;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Lightweight round-trip to check the store answers.
    Probe { id: u64 },

    /// Resolve a session token to its organization.
    Whoami { id: u64, token: String },

    /// Insert or update a record in the category's collection.
    Upsert {
        id: u64,
        category: Category,
        record: Payload,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Response to a Probe.
    ProbeOk { id: u64 },

    /// Response to Whoami. `organization_id` is absent when the token is
    /// unknown or has no membership.
    Tenant {
        id: u64,
        organization_id: Option<String>,
    },

    /// The record was written; carries the server-side update time.
    Upserted { id: u64, updated_at: DateTime<Utc> },

    /// The request was understood but refused.
    Rejected { id: u64, message: String },

    /// The request could not be processed at all.
    Error { message: String },
}

impl ClientMessage {
    /// Creates a Probe message.
    pub fn probe(id: u64) -> Self {
        ClientMessage::Probe { id }
    }

    /// Creates a Whoami message.
    pub fn whoami(id: u64, token: impl Into<String>) -> Self {
        ClientMessage::Whoami {
            id,
            token: token.into(),
        }
    }

    /// Creates an Upsert message.
    pub fn upsert(id: u64, category: Category, record: Payload) -> Self {
        ClientMessage::Upsert {
            id,
            category,
            record,
        }
    }

    /// Returns the request id.
    pub fn id(&self) -> u64 {
        match self {
            ClientMessage::Probe { id }
            | ClientMessage::Whoami { id, .. }
            | ClientMessage::Upsert { id, .. } => *id,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a ProbeOk message.
    pub fn probe_ok(id: u64) -> Self {
        ServerMessage::ProbeOk { id }
    }

    /// Creates a Tenant message.
    pub fn tenant(id: u64, organization_id: Option<String>) -> Self {
        ServerMessage::Tenant {
            id,
            organization_id,
        }
    }

    /// Creates an Upserted message.
    pub fn upserted(id: u64, updated_at: DateTime<Utc>) -> Self {
        ServerMessage::Upserted { id, updated_at }
    }

    /// Creates a Rejected message.
    pub fn rejected(id: u64, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            id,
            message: message.into(),
        }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Returns the request id this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::ProbeOk { id }
            | ServerMessage::Tenant { id, .. }
            | ServerMessage::Upserted { id, .. }
            | ServerMessage::Rejected { id, .. } => Some(*id),
            ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
