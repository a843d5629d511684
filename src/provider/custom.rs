use super::{type_key, Request, StubProvider};
use crate::error::StubError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Caller-registered stubs, keyed by type.
///
/// A registered stub is used wherever its type is requested, including where
/// the type would otherwise fail to resolve (for example because it contains
/// itself directly).
#[derive(Debug, Clone, Default)]
pub struct CustomStubs {
    stubs: HashMap<&'static str, Value>,
}

impl CustomStubs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` as the stub for every requested `T`.
    pub fn insert<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), StubError> {
        let value = serde_json::to_value(value)?;
        self.insert_value::<T>(value);
        Ok(())
    }

    /// Registers an already-serialized stub for `T`.
    pub fn insert_value<T: ?Sized>(&mut self, value: Value) {
        self.stubs.insert(type_key::<T>(), value);
    }

    pub fn remove<T: ?Sized>(&mut self) -> Option<Value> {
        self.stubs.remove(type_key::<T>())
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

impl StubProvider for CustomStubs {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        Ok(request
            .type_name()
            .and_then(|name| self.stubs.get(name))
            .cloned())
    }
}
