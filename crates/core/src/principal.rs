//! Authenticated actor attached to every engine call.
//!
//! Authentication and role gating happen upstream; the domain only records who
//! did what (`createdBy`, `approvedBy`, `performedBy`).

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// Role name as supplied by the auth layer (e.g. `admin`, `head_of_warehouse`).
///
/// Roles are opaque strings here; mapping roles to permissions is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const WAREHOUSE_STAFF: Role = Role(Cow::Borrowed("warehouse_staff"));
    pub const HEAD_OF_WAREHOUSE: Role = Role(Cow::Borrowed("head_of_warehouse"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated principal `{id, role}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}
