//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use ccommon::{GenerationOptions, MessageId, MetadataMap, SessionId, TraceId};
//!
//! let session = SessionId::from("session-1");
//! let trace = TraceId::new("trace-1");
//! let message = MessageId::generate();
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "acme".to_string());
//!
//! let options = GenerationOptions::default().with_temperature(0.3);
//! assert_eq!(session.as_str(), "session-1");
//! assert_eq!(trace.to_string(), "trace-1");
//! assert!(!message.as_str().is_empty());
//! assert_eq!(options.temperature, Some(0.3));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use ccommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use ccommon::{MessageId, SessionId, TraceId};
    //!
    //! let session = SessionId::new("session-42");
    //! let trace = TraceId::from("trace-42");
    //! let first = MessageId::generate();
    //! let second = MessageId::generate();
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert_eq!(trace.as_str(), "trace-42");
    //! assert_ne!(first, second);
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    use serde::{Deserialize, Serialize};

    pub type MetadataMap = HashMap<String, String>;

    macro_rules! string_id {
        ($name:ident) => {
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
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

    string_id!(SessionId);
    string_id!(TraceId);
    string_id!(MessageId);

    impl SessionId {
        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().to_string())
        }
    }

    impl TraceId {
        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().simple().to_string())
        }
    }

    impl MessageId {
        pub fn generate() -> Self {
            Self(uuid::Uuid::new_v4().to_string())
        }
    }
}

pub mod model {
    //! Shared generation settings used by request types.
    //!
    //! ```rust
    //! use ccommon::GenerationOptions;
    //!
    //! let options = GenerationOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(128);
    //!
    //! assert_eq!(options.temperature, Some(0.2));
    //! assert_eq!(options.max_tokens, Some(128));
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct GenerationOptions {
        pub temperature: Option<f32>,
        pub max_tokens: Option<u32>,
    }

    impl GenerationOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = Some(max_tokens);
            self
        }
    }
}

pub mod registry {
    //! Concurrent registry map shared by runtime registries.
    //!
    //! Reads never block other reads and writes are serialized per key. Values are
    //! cloned out of the map so callers never hold a shard lock across an await.
    //!
    //! ```rust
    //! use ccommon::Registry;
    //!
    //! let registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::fmt::{Debug, Formatter};
    use std::hash::Hash;

    use dashmap::DashMap;
    use dashmap::mapref::entry::Entry;

    pub struct Registry<K, V>
    where
        K: Eq + Hash,
    {
        items: DashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: DashMap::new(),
            }
        }
    }

    impl<K, V> Debug for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Registry")
                .field("len", &self.items.len())
                .finish()
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
        V: Clone,
    {
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts `value`, returning the entry it replaced.
        pub fn insert(&self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        /// Inserts `value` only when `key` is vacant. Returns `false` if the key was taken.
        pub fn try_insert(&self, key: K, value: V) -> bool {
            match self.items.entry(key) {
                Entry::Occupied(_) => false,
                Entry::Vacant(slot) => {
                    slot.insert(value);
                    true
                }
            }
        }

        pub fn get<Q>(&self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key).map(|entry| entry.value().clone())
        }

        pub fn remove<Q>(&self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key).map(|(_, value)| value)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        /// Point-in-time copy of every value.
        pub fn values(&self) -> Vec<V> {
            self.items
                .iter()
                .map(|entry| entry.value().clone())
                .collect()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{MessageId, MetadataMap, SessionId, TraceId};
pub use future::BoxFuture;
pub use model::GenerationOptions;
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{GenerationOptions, MessageId, Registry, SessionId, TraceId};

    #[test]
    fn id_newtypes_round_trip_strings() {
        let session = SessionId::new("session-1");
        let trace = TraceId::from("trace-1");

        assert_eq!(session.as_str(), "session-1");
        assert_eq!(trace.as_str(), "trace-1");
        assert_eq!(session.to_string(), "session-1");
        assert_eq!(trace.to_string(), "trace-1");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let session = SessionId::new("s-9");
        let json = serde_json::to_string(&session).expect("session id should serialize");
        assert_eq!(json, "\"s-9\"");
    }

    #[test]
    fn generated_message_ids_are_unique() {
        let first = MessageId::generate();
        let second = MessageId::generate();
        assert_ne!(first, second);
    }

    #[test]
    fn generation_options_builder_helpers_set_values() {
        let options = GenerationOptions::default()
            .with_temperature(0.3)
            .with_max_tokens(123);

        assert_eq!(options.temperature, Some(0.3));
        assert_eq!(options.max_tokens, Some(123));
    }

    #[test]
    fn generic_registry_basic_lifecycle() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("alpha".to_string(), 1_u32);
        assert_eq!(registry.get("alpha"), Some(1));
        assert!(registry.contains_key("alpha"));
        assert_eq!(registry.len(), 1);

        let replaced = registry.insert("alpha".to_string(), 2_u32);
        assert_eq!(replaced, Some(1));
        assert_eq!(registry.get("alpha"), Some(2));

        let removed = registry.remove("alpha");
        assert_eq!(removed, Some(2));
        assert!(registry.is_empty());
    }

    #[test]
    fn try_insert_keeps_existing_entry() {
        let registry = Registry::new();
        assert!(registry.try_insert("s1".to_string(), 1_u8));
        assert!(!registry.try_insert("s1".to_string(), 2_u8));
        assert_eq!(registry.get("s1"), Some(1));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        let registry = Arc::new(Registry::new());
        let handles = (0..8)
            .map(|index| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry.insert(format!("key-{index}"), index);
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().expect("writer thread should finish");
        }

        assert_eq!(registry.len(), 8);
        let mut values = registry.values();
        values.sort_unstable();
        assert_eq!(values, (0..8).collect::<Vec<_>>());
    }
}
