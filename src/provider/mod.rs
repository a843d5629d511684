//! Terminal values resolved without recursing into a type.
//!
//! A [`StubProvider`] looks at a [`Request`] and either answers it with a
//! `serde_json::Value`, which the engine replays into the requesting type, or
//! declines so that the engine decodes the type structurally.

mod custom;
mod defaults;
mod enums;

pub use custom::CustomStubs;
pub use defaults::DefaultStubs;
pub use enums::{EnumCase, EnumCases, EnumStubs};

use crate::context::Path;
use crate::error::StubError;
use serde_json::Value;
use std::fmt;

// Pointer types whose Deserialize impl hands the deserializer straight to the
// pointee, so they never show up as a type of their own.
const TRANSPARENT_POINTERS: &[&str] = &["alloc::boxed::Box<", "alloc::rc::Rc<", "alloc::sync::Arc<"];

const OPTION: &str = "core::option::Option<";

/// The name a requested type is known by, with transparent pointers removed.
///
/// `Box<Item>`, `Arc<Item>` and `Item` all share one key.
pub fn type_key<T: ?Sized>() -> &'static str {
    canonical(std::any::type_name::<T>())
}

pub(crate) fn canonical(mut name: &'static str) -> &'static str {
    while let Some(inner) = TRANSPARENT_POINTERS
        .iter()
        .find_map(|prefix| unwrap_generic(name, prefix))
    {
        name = inner;
    }

    name
}

/// `T` for a type named `Option<T>`.
pub(crate) fn option_payload(name: &'static str) -> Option<&'static str> {
    unwrap_generic(name, OPTION).map(canonical)
}

fn unwrap_generic(name: &'static str, prefix: &str) -> Option<&'static str> {
    name.strip_prefix(prefix)?.strip_suffix('>')
}

/// The shape of value a type asked the engine for.
///
/// Each variant corresponds to one `serde::Deserializer` entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Any,
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    U8,
    U16,
    U32,
    U64,
    U128,
    F32,
    F64,
    Char,
    Str,
    String,
    Bytes,
    ByteBuf,
    Option,
    Unit,
    UnitStruct {
        name: &'static str,
    },
    NewtypeStruct {
        name: &'static str,
    },
    Seq,
    Tuple {
        len: usize,
    },
    TupleStruct {
        name: &'static str,
        len: usize,
    },
    Map,
    Struct {
        name: &'static str,
        fields: &'static [&'static str],
    },
    Enum {
        name: &'static str,
        variants: &'static [&'static str],
    },
    Identifier,
    IgnoredAny,
}

impl Hint {
    /// The container name the type declared, for named aggregates.
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Hint::UnitStruct { name }
            | Hint::NewtypeStruct { name }
            | Hint::TupleStruct { name, .. }
            | Hint::Struct { name, .. }
            | Hint::Enum { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The type a scalar request resolves as when the requesting type has no
    /// stub of its own.
    pub fn scalar_type(&self) -> Option<&'static str> {
        let name = match self {
            Hint::Bool => type_key::<bool>(),
            Hint::I8 => type_key::<i8>(),
            Hint::I16 => type_key::<i16>(),
            Hint::I32 => type_key::<i32>(),
            Hint::I64 => type_key::<i64>(),
            Hint::I128 => type_key::<i128>(),
            Hint::U8 => type_key::<u8>(),
            Hint::U16 => type_key::<u16>(),
            Hint::U32 => type_key::<u32>(),
            Hint::U64 => type_key::<u64>(),
            Hint::U128 => type_key::<u128>(),
            Hint::F32 => type_key::<f32>(),
            Hint::F64 => type_key::<f64>(),
            Hint::Char => type_key::<char>(),
            Hint::Str => type_key::<str>(),
            Hint::String | Hint::Identifier | Hint::Any => type_key::<String>(),
            Hint::Bytes | Hint::ByteBuf => type_key::<[u8]>(),
            Hint::Unit | Hint::IgnoredAny => type_key::<()>(),
            _ => return None,
        };

        Some(name)
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hint::Any => f.write_str("any value"),
            Hint::Bool => f.write_str("bool"),
            Hint::I8 => f.write_str("i8"),
            Hint::I16 => f.write_str("i16"),
            Hint::I32 => f.write_str("i32"),
            Hint::I64 => f.write_str("i64"),
            Hint::I128 => f.write_str("i128"),
            Hint::U8 => f.write_str("u8"),
            Hint::U16 => f.write_str("u16"),
            Hint::U32 => f.write_str("u32"),
            Hint::U64 => f.write_str("u64"),
            Hint::U128 => f.write_str("u128"),
            Hint::F32 => f.write_str("f32"),
            Hint::F64 => f.write_str("f64"),
            Hint::Char => f.write_str("char"),
            Hint::Str | Hint::String => f.write_str("string"),
            Hint::Bytes | Hint::ByteBuf => f.write_str("bytes"),
            Hint::Option => f.write_str("option"),
            Hint::Unit => f.write_str("unit"),
            Hint::UnitStruct { name } => write!(f, "unit struct {}", name),
            Hint::NewtypeStruct { name } => write!(f, "newtype struct {}", name),
            Hint::Seq => f.write_str("sequence"),
            Hint::Tuple { len } => write!(f, "tuple of {}", len),
            Hint::TupleStruct { name, .. } => write!(f, "tuple struct {}", name),
            Hint::Map => f.write_str("map"),
            Hint::Struct { name, .. } => write!(f, "struct {}", name),
            Hint::Enum { name, .. } => write!(f, "enum {}", name),
            Hint::Identifier => f.write_str("identifier"),
            Hint::IgnoredAny => f.write_str("ignored value"),
        }
    }
}

/// A single value the engine needs.
#[derive(Debug, Clone, Copy)]
pub struct Request<'r> {
    type_name: Option<&'static str>,
    hint: Hint,
    path: &'r Path,
}

impl<'r> Request<'r> {
    pub fn new(type_name: Option<&'static str>, hint: Hint, path: &'r Path) -> Self {
        Request {
            type_name: type_name.map(canonical),
            hint,
            path,
        }
    }

    /// Canonical name of the requested type, when the engine knows it.
    ///
    /// Payloads of newtype structs are requested without a type name.
    pub fn type_name(&self) -> Option<&'static str> {
        self.type_name
    }

    pub fn hint(&self) -> Hint {
        self.hint
    }

    pub fn path(&self) -> &'r Path {
        self.path
    }

    /// Whether this request is for a `T` (or a transparent pointer to one).
    pub fn is<T: ?Sized>(&self) -> bool {
        self.type_name == Some(type_key::<T>())
    }
}

/// Resolves requests to terminal values.
///
/// An `Err` is local to the provider: the chain keeps looking, and the error
/// is only surfaced if nothing else can build the value.
pub trait StubProvider: Send + Sync {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError>;
}

impl<P: StubProvider + ?Sized> StubProvider for Box<P> {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        (**self).provide(request)
    }
}

impl<P: StubProvider + ?Sized> StubProvider for &P {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        (**self).provide(request)
    }
}

/// A provider backed by a closure. See [`from_fn`].
pub struct FnProvider<F>(F);

/// Wraps a closure as a provider.
///
/// ```
/// use serde_stub::{provider, Hint, Session};
///
/// let session = Session::new().append_provider(provider::from_fn(|request| {
///     match request.hint() {
///         Hint::U16 => Some(serde_json::json!(443)),
///         _ => None,
///     }
/// }));
///
/// // The default table answers before appended providers do.
/// assert_eq!(session.make::<u16>().unwrap(), 8128);
/// ```
pub fn from_fn<F>(f: F) -> FnProvider<F>
where
    F: Fn(&Request<'_>) -> Option<Value> + Send + Sync,
{
    FnProvider(f)
}

impl<F> StubProvider for FnProvider<F>
where
    F: Fn(&Request<'_>) -> Option<Value> + Send + Sync,
{
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        Ok((self.0)(request))
    }
}

/// An ordered list of providers; the first match wins.
///
/// A chain is itself a provider, so chains nest.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn StubProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Consult `provider` after every provider already in the chain.
    pub fn push<P: StubProvider + 'static>(&mut self, provider: P) {
        self.providers.push(Box::new(provider));
    }

    /// Consult `provider` before every provider already in the chain.
    pub fn prepend<P: StubProvider + 'static>(&mut self, provider: P) {
        self.providers.insert(0, Box::new(provider));
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &dyn StubProvider> {
        self.providers.iter().map(|provider| provider.as_ref() as &dyn StubProvider)
    }
}

impl StubProvider for ProviderChain {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        first_match(self.iter(), request)
    }
}

/// Runs `providers` in order, returning the first value found.
///
/// When nothing matches, the first provider error (if any) is returned so the
/// caller can surface it should structural decoding fail too.
pub(crate) fn first_match<'p, I>(providers: I, request: &Request<'_>) -> Result<Option<Value>, StubError>
where
    I: IntoIterator<Item = &'p dyn StubProvider>,
{
    let mut deferred = None;

    for provider in providers {
        match provider.provide(request) {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(err) => {
                if deferred.is_none() {
                    deferred = Some(err);
                }
            }
        }
    }

    match deferred {
        Some(err) => Err(err),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Value);

    impl StubProvider for Fixed {
        fn provide(&self, _: &Request<'_>) -> Result<Option<Value>, StubError> {
            Ok(Some(self.0.clone()))
        }
    }

    struct Failing;

    impl StubProvider for Failing {
        fn provide(&self, _: &Request<'_>) -> Result<Option<Value>, StubError> {
            Err(StubError::Custom("failing".to_owned()))
        }
    }

    #[test]
    fn test_canonical() {
        assert_eq!(type_key::<Box<String>>(), type_key::<String>());
        assert_eq!(type_key::<std::sync::Arc<Box<u8>>>(), "u8");
        assert_eq!(
            option_payload(std::any::type_name::<Option<Box<u8>>>()),
            Some("u8")
        );
        assert_eq!(option_payload(std::any::type_name::<Vec<u8>>()), None);
    }

    #[test]
    fn test_first_match_wins() {
        let path = Path::root();
        let request = Request::new(None, Hint::Bool, &path);

        let mut chain = ProviderChain::new();
        chain.push(from_fn(|_| None));
        chain.push(Fixed(json!(1)));
        chain.push(Fixed(json!(2)));
        assert_eq!(chain.provide(&request), Ok(Some(json!(1))));

        chain.prepend(Fixed(json!(0)));
        assert_eq!(chain.provide(&request), Ok(Some(json!(0))));
        assert_eq!(chain.len(), 4);
    }

    #[test]
    fn test_errors_fall_through() {
        let path = Path::root();
        let request = Request::new(None, Hint::Bool, &path);

        let mut chain = ProviderChain::new();
        chain.push(Failing);
        chain.push(Fixed(json!(true)));
        assert_eq!(chain.provide(&request), Ok(Some(json!(true))));

        let mut chain = ProviderChain::new();
        chain.push(Failing);
        chain.push(from_fn(|_| None));
        assert_eq!(
            chain.provide(&request),
            Err(StubError::Custom("failing".to_owned()))
        );
    }

    #[test]
    fn test_chains_nest() {
        let path = Path::root();
        let request = Request::new(Some("u8"), Hint::U8, &path);

        let mut inner = ProviderChain::new();
        inner.push(from_fn(|request| {
            if request.is::<u8>() {
                Some(json!(7))
            } else {
                None
            }
        }));

        let mut outer = ProviderChain::new();
        outer.push(inner);
        outer.push(Fixed(json!(9)));
        assert_eq!(outer.provide(&request), Ok(Some(json!(7))));
    }
}
