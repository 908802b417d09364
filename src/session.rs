//! Authenticated session passed explicitly to every operation that needs it.
//!
//! Tokens are issued and verified by the backend. This module only decodes
//! the claims segment of a bearer token so callers can gate operations by
//! role; it performs no signature verification.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no bearer token supplied")]
    MissingToken,
    #[error("malformed bearer token: {0}")]
    MalformedToken(String),
    #[error("session token expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("role {role} may not {capability}")]
    Forbidden { role: Role, capability: Capability },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::User => matches!(capability, Capability::ViewBudgets),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Role::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewBudgets,
    ManageClients,
    ManageProjects,
    ManageRateCards,
    ManageStaffing,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Capability::ViewBudgets => "view budgets",
            Capability::ManageClients => "manage clients",
            Capability::ManageProjects => "manage projects",
            Capability::ManageRateCards => "manage rate cards",
            Capability::ManageStaffing => "manage staffing",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// Expiry as Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    claims: Claims,
}

impl Session {
    /// Accepts either an `Authorization` header value (`Bearer <token>`) or
    /// the raw token.
    pub fn from_bearer(value: &str) -> Result<Self, SessionError> {
        let value = value.trim();
        let token = match value.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            _ if value.eq_ignore_ascii_case("bearer") => "",
            _ => value,
        };
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return Err(SessionError::MalformedToken(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(parts[1].trim_end_matches('='))
            .map_err(|e| SessionError::MalformedToken(format!("invalid claims encoding: {e}")))?;
        let claims: Claims = serde_json::from_slice(&payload)
            .map_err(|e| SessionError::MalformedToken(format!("invalid claims: {e}")))?;

        Ok(Self { claims })
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    /// Rejects a token whose `exp` is at or before `now`. Tokens without an
    /// expiry never lapse here.
    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<(), SessionError> {
        let Some(exp) = self.claims.exp else {
            return Ok(());
        };
        match DateTime::<Utc>::from_timestamp(exp, 0) {
            Some(expires_at) if expires_at > now => Ok(()),
            Some(expires_at) => Err(SessionError::Expired(expires_at)),
            None => Err(SessionError::MalformedToken(format!(
                "expiry {exp} out of range"
            ))),
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), SessionError> {
        if self.role().allows(capability) {
            Ok(())
        } else {
            Err(SessionError::Forbidden {
                role: self.role(),
                capability,
            })
        }
    }
}

/// Builds an unsigned token carrying `claims`, in the same three-segment
/// layout the backend issues. Useful for fixtures and local tooling.
pub fn encode_unsigned_token(claims: &Claims) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = serde_json::to_vec(claims)
        .map(|bytes| URL_SAFE_NO_PAD.encode(bytes))
        .unwrap_or_default();
    format!("{header}.{payload}.")
}
