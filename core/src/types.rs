//! Shared primitive types used across the desk.

/// Monotonic row id of an account. Customers authenticate as their account,
/// so a customer actor's id is also an `AccountId`.
pub type AccountId = i64;

/// Monotonic row id of a fund request.
pub type RequestId = i64;

/// Id of whoever is acting: a staff user or a customer account.
pub type ActorId = i64;

pub type NotificationId = i64;

pub type AuditId = i64;

/// Money in the smallest currency unit. Single currency only.
pub type Amount = i64;
