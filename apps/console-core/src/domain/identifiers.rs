//! Strongly-typed identifiers for console entities.
//!
//! These prevent mixing up backend-assigned order ids with client-generated
//! idempotency tokens.

use std::fmt;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(OrderId, "Backend-assigned identifier for an order.");
define_id!(
    IdempotencyKey,
    "Client-generated token that deduplicates order submissions."
);

impl IdempotencyKey {
    /// Generate a fresh collision-resistant token.
    ///
    /// Draws 16 bytes from the operating system CSPRNG and formats them as a
    /// version-4 UUID. When the OS source is unavailable the bytes come from
    /// a process-wide time-seeded stream instead; the token format is
    /// identical either way.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        match OsRng.try_fill_bytes(&mut bytes) {
            Ok(()) => Self(format_token(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, "OS entropy unavailable, using fallback token stream");
                Self(format_token(fallback_bytes()))
            }
        }
    }
}

/// Format 16 random bytes as a hyphenated, version/variant-tagged token.
fn format_token(bytes: [u8; 16]) -> String {
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

/// Draw bytes from the shared fallback stream.
///
/// The stream is seeded once per process and advances on every call, so
/// back-to-back fallback tokens cannot collide the way per-call time seeds
/// would inside a single timer tick.
fn fallback_bytes() -> [u8; 16] {
    static STREAM: OnceLock<Mutex<SmallRng>> = OnceLock::new();

    let mut bytes = [0u8; 16];
    let stream = STREAM.get_or_init(|| Mutex::new(SmallRng::seed_from_u64(clock_seed())));
    if let Ok(mut rng) = stream.lock() {
        rng.fill_bytes(&mut bytes);
    } else {
        SmallRng::seed_from_u64(clock_seed()).fill_bytes(&mut bytes);
    }
    bytes
}

/// Seed material from the wall clock, for when real entropy is missing.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn order_id_new_and_display() {
        let id = OrderId::new("ord-123");
        assert_eq!(id.as_str(), "ord-123");
        assert_eq!(format!("{id}"), "ord-123");
    }

    #[test]
    fn order_id_equality() {
        let id1 = OrderId::new("ord-123");
        let id2 = OrderId::new("ord-123");
        let id3 = OrderId::new("ord-456");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn order_id_from_string() {
        let id: OrderId = "ord-123".into();
        assert_eq!(id.as_str(), "ord-123");

        let id: OrderId = String::from("ord-456").into();
        assert_eq!(id.as_str(), "ord-456");
    }

    #[test]
    fn order_id_into_inner() {
        let id = OrderId::new("ord-123");
        assert_eq!(id.into_inner(), "ord-123");
    }

    #[test]
    fn serde_roundtrip() {
        let id = OrderId::new("ord-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ord-123\"");

        let parsed: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn hash_works_for_collections() {
        let mut set = HashSet::new();
        set.insert(OrderId::new("ord-1"));
        set.insert(OrderId::new("ord-2"));
        set.insert(OrderId::new("ord-1")); // duplicate

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn generated_key_is_v4_format() {
        let key = IdempotencyKey::generate();
        let parsed = uuid::Uuid::parse_str(key.as_str()).unwrap();
        assert_eq!(parsed.get_version(), Some(uuid::Version::Random));
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn generated_keys_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(IdempotencyKey::generate().into_inner()));
        }
    }

    #[test]
    fn fallback_tokens_keep_v4_format() {
        let token = format_token(fallback_bytes());
        let parsed = uuid::Uuid::parse_str(&token).unwrap();
        assert_eq!(parsed.get_version(), Some(uuid::Version::Random));
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn fallback_tokens_do_not_collide() {
        // The stream advances per call, so even same-instant draws differ.
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(format_token(fallback_bytes())));
        }
    }

    #[test]
    fn keys_are_not_derived_from_each_other() {
        let a = IdempotencyKey::generate();
        let b = IdempotencyKey::generate();
        assert_ne!(a, b);
    }
}
