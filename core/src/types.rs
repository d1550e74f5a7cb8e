//! Request and response payloads of the Noraina API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently,
//! so the integration tests catch any drift between the two.

use serde::{Deserialize, Serialize};

/// Body of `POST api/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
}

/// Body of `POST api/instance`. `services` is always sent as an array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceRequest {
    pub name: String,
    pub services: Vec<InstanceServiceRequest>,
}

/// A service exposed by an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstanceServiceRequest {
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    #[serde(default)]
    pub services: Vec<InstanceServiceRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// PEM material returned by `GET api/certificate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Certificate {
    pub name: String,
    pub certificate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}
