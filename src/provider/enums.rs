use super::{type_key, Request, StubProvider};
use crate::error::{EnumShape, StubError};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// One declared case of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCase<T> {
    /// A case without associated data, as a value.
    Unit(T),
    /// A case with associated data; only its name is known.
    WithData(&'static str),
}

/// Declares the full case set of an enum, in declaration order.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use serde_stub::{EnumCase, EnumCases, Session};
///
/// #[derive(Debug, PartialEq, Serialize)]
/// enum Status {
///     OnSale,
///     SoldOut,
/// }
///
/// // A hand-written impl that only understands its own spellings.
/// impl<'de> Deserialize<'de> for Status {
///     fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
///         match String::deserialize(d)?.as_str() {
///             "OnSale" => Ok(Status::OnSale),
///             "SoldOut" => Ok(Status::SoldOut),
///             other => Err(serde::de::Error::custom(format!("unknown status {}", other))),
///         }
///     }
/// }
///
/// impl EnumCases for Status {
///     fn cases() -> Vec<EnumCase<Self>> {
///         vec![EnumCase::Unit(Status::OnSale), EnumCase::Unit(Status::SoldOut)]
///     }
/// }
///
/// let session = Session::new().enum_cases::<Status>();
/// assert_eq!(session.make::<Status>().unwrap(), Status::OnSale);
/// ```
pub trait EnumCases: Serialize + Sized {
    fn cases() -> Vec<EnumCase<Self>>;
}

type Synthesize = fn(&'static str) -> Result<Value, StubError>;

/// Builds argument-less enums from their first declared case.
#[derive(Default)]
pub struct EnumStubs {
    enums: HashMap<&'static str, Synthesize>,
}

impl EnumStubs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<E: EnumCases>(&mut self) {
        self.enums.insert(type_key::<E>(), first_case::<E>);
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}

/// The first case of `E`, as long as no case carries data.
pub fn first_case<E: EnumCases>(type_name: &'static str) -> Result<Value, StubError> {
    let cases = E::cases();

    if let Some(case) = cases.iter().find_map(|case| match case {
        EnumCase::WithData(name) => Some(*name),
        EnumCase::Unit(_) => None,
    }) {
        return Err(StubError::UnsupportedEnumShape {
            type_name,
            shape: EnumShape::DataCarrying { case },
        });
    }

    match cases.into_iter().next() {
        Some(EnumCase::Unit(first)) => Ok(serde_json::to_value(first)?),
        _ => Err(StubError::UnsupportedEnumShape {
            type_name,
            shape: EnumShape::NoCases,
        }),
    }
}

impl StubProvider for EnumStubs {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        let (type_name, synthesize) = match request
            .type_name()
            .and_then(|name| self.enums.get_key_value(name))
        {
            Some((&type_name, synthesize)) => (type_name, synthesize),
            None => return Ok(None),
        };

        synthesize(type_name).map(Some)
    }
}
