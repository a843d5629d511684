//! The decode engine: a `serde::Deserializer` that invents its input.
//!
//! Every value a type asks for is first offered to the provider chain. Only
//! when no provider answers does the engine drive the type's visitor itself,
//! handing out fields, elements and enum cases backed by fresh child engines.

use crate::context::{Context, Locator, Path};
use crate::error::{EnumShape, StubError};
use crate::provider::{canonical, option_payload, Hint, Request};
use serde::de::value::{BorrowedStrDeserializer, U32Deserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};
use serde::Deserializer;
use serde_json::Value;
use std::any::type_name;
use tracing::{debug, trace};

/// Builds a `T` from nothing but the providers and limits in `cx`.
pub(crate) fn stub<T: DeserializeOwned>(cx: Context<'_>) -> Result<T, StubError> {
    T::deserialize(StubDeserializer::root(cx, type_name::<T>()))
}

// A type on the active resolution chain. The full type name is unknown only
// below a hand-written impl that asks for an option of its own accord; two
// such anonymous entries are compared by serde container name.
#[derive(Debug, Clone, Copy)]
struct Identity {
    type_name: Option<&'static str>,
    name: &'static str,
}

impl Identity {
    fn same_type(&self, other: &Identity) -> bool {
        match (self.type_name, other.type_name) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

// Whether a child keeps its parent's ancestors. Sequence elements, map
// entries and option payloads start over: their recursion is already bounded
// by the depth budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Inherit,
    Fresh,
}

pub(crate) struct StubDeserializer<'a> {
    cx: Context<'a>,
    path: Path,
    guard: Vec<Identity>,
    // Targets of the options entered at this same path. An option payload
    // does not move the path, so meeting one of these again means the type
    // hands itself its own option without ever reaching a field or element.
    options: Vec<Option<&'static str>>,
    target: Option<&'static str>,
}

impl<'a> StubDeserializer<'a> {
    fn root(cx: Context<'a>, target: &'static str) -> Self {
        StubDeserializer {
            cx,
            path: Path::root(),
            guard: Vec::new(),
            options: Vec::new(),
            target: Some(canonical(target)),
        }
    }

    fn child(&self, locator: Option<Locator>, target: Option<&'static str>, scope: Scope) -> Self {
        StubDeserializer {
            cx: self.cx,
            path: match locator {
                Some(locator) => self.path.join(locator),
                None => self.path.clone(),
            },
            guard: match scope {
                Scope::Inherit => self.guard.clone(),
                Scope::Fresh => Vec::new(),
            },
            options: match locator {
                Some(_) => Vec::new(),
                None => self.options.clone(),
            },
            target: target.map(canonical),
        }
    }

    fn provide(&self, hint: Hint) -> Result<Option<Value>, StubError> {
        let provided = self
            .cx
            .providers
            .provide(&Request::new(self.target, hint, &self.path));

        if let Ok(Some(_)) = provided {
            trace!(
                path = %self.path,
                type_name = ?self.target,
                hint = %hint,
                "stub: provider resolved value"
            );
        }

        provided
    }

    // The scalar a type asked for, requested in its own right. This is how a
    // type with a hand-written impl that reads a string ends up with the
    // default string.
    fn provide_scalar(&self, hint: Hint) -> Option<Value> {
        let scalar = hint
            .scalar_type()
            .filter(|&scalar| self.target != Some(scalar))?;

        self.cx
            .providers
            .provide(&Request::new(Some(scalar), hint, &self.path))
            .ok()
            .flatten()
    }

    /// Provider chain first; structural decoding otherwise.
    ///
    /// A provider error is held back and reported only if structural decoding
    /// fails as well, and not by the type's own routine.
    fn resolve<'de, V, R, S>(
        self,
        hint: Hint,
        visitor: V,
        replay: R,
        structural: S,
    ) -> Result<V::Value, StubError>
    where
        V: Visitor<'de>,
        R: FnOnce(Value, V) -> Result<V::Value, serde_json::Error>,
        S: FnOnce(Self, V) -> Result<V::Value, StubError>,
    {
        match self.provide(hint) {
            Ok(Some(value)) => replay(value, visitor).map_err(StubError::from),
            Ok(None) => structural(self, visitor),
            // The type's own errors win over the provider's.
            Err(deferred) => structural(self, visitor).map_err(|err| match err {
                StubError::Custom(_) => err,
                _ => deferred,
            }),
        }
    }

    fn scalar<'de, V, R>(self, hint: Hint, visitor: V, replay: R) -> Result<V::Value, StubError>
    where
        V: Visitor<'de>,
        R: FnOnce(Value, V) -> Result<V::Value, serde_json::Error>,
    {
        let value = match self.provide(hint) {
            Ok(Some(value)) => value,
            outcome => match self.provide_scalar(hint) {
                Some(value) => value,
                None => {
                    return Err(outcome.err().unwrap_or_else(|| {
                        de::Error::custom(format_args!(
                            "no stub provider resolves {} at {}",
                            hint, self.path
                        ))
                    }))
                }
            },
        };

        replay(value, visitor).map_err(StubError::from)
    }

    /// Marks a named type as being resolved, failing if it already is.
    fn enter(mut self, name: &'static str) -> Result<Self, StubError> {
        let identity = Identity {
            type_name: self.target,
            name,
        };

        if let Some(ancestor) = self
            .guard
            .iter()
            .find(|ancestor| ancestor.same_type(&identity))
        {
            let type_name = ancestor.type_name.or(identity.type_name).unwrap_or(name);
            debug!(type_name, path = %self.path, "stub: type requires itself");
            return Err(StubError::Cycle { type_name });
        }

        self.guard.push(identity);
        Ok(self)
    }

    fn sequence_len(&self) -> usize {
        self.cx.config.sequence_len(&self.path)
    }
}

macro_rules! scalar_hooks {
    ($($method:ident => $hint:ident,)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, StubError> {
                self.scalar(Hint::$hint, visitor, |value, visitor| value.$method(visitor))
            }
        )*
    };
}

impl<'de, 'a> Deserializer<'de> for StubDeserializer<'a> {
    type Error = StubError;

    scalar_hooks! {
        deserialize_any => Any,
        deserialize_bool => Bool,
        deserialize_i8 => I8,
        deserialize_i16 => I16,
        deserialize_i32 => I32,
        deserialize_i64 => I64,
        deserialize_i128 => I128,
        deserialize_u8 => U8,
        deserialize_u16 => U16,
        deserialize_u32 => U32,
        deserialize_u64 => U64,
        deserialize_u128 => U128,
        deserialize_f32 => F32,
        deserialize_f64 => F64,
        deserialize_char => Char,
        deserialize_str => Str,
        deserialize_string => String,
        deserialize_bytes => Bytes,
        deserialize_byte_buf => ByteBuf,
        deserialize_unit => Unit,
        deserialize_identifier => Identifier,
        deserialize_ignored_any => IgnoredAny,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::Option,
            visitor,
            |value, visitor| value.deserialize_option(visitor),
            |engine, visitor| {
                if engine.cx.config.is_absent(&engine.path) {
                    return visitor.visit_none();
                }

                if engine.options.contains(&engine.target) {
                    let type_name = engine
                        .options
                        .iter()
                        .chain(Some(&engine.target))
                        .find_map(|&target| target)
                        .unwrap_or_else(type_name::<V::Value>);
                    debug!(type_name, path = %engine.path, "stub: option requires itself");
                    return Err(StubError::Cycle { type_name });
                }

                let mut payload =
                    engine.child(None, engine.target.and_then(option_payload), Scope::Fresh);
                payload.options.push(engine.target);
                visitor.visit_some(payload)
            },
        )
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::UnitStruct { name },
            visitor,
            |value, visitor| value.deserialize_unit_struct(name, visitor),
            |_, visitor| visitor.visit_unit(),
        )
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::NewtypeStruct { name },
            visitor,
            |value, visitor| value.deserialize_newtype_struct(name, visitor),
            // Driven as a one-element tuple so the payload is requested with
            // its own type, which `visit_newtype_struct` would not reveal.
            |engine, visitor| {
                let engine = engine.enter(name)?;
                visitor.visit_seq(ElementAccess::new(engine, 1, Scope::Inherit))
            },
        )
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::Seq,
            visitor,
            |value, visitor| value.deserialize_seq(visitor),
            |engine, visitor| {
                let len = engine.sequence_len();
                visitor.visit_seq(ElementAccess::new(engine, len, Scope::Fresh))
            },
        )
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::Tuple { len },
            visitor,
            |value, visitor| value.deserialize_tuple(len, visitor),
            |engine, visitor| visitor.visit_seq(ElementAccess::new(engine, len, Scope::Inherit)),
        )
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::TupleStruct { name, len },
            visitor,
            |value, visitor| value.deserialize_tuple_struct(name, len, visitor),
            |engine, visitor| {
                let engine = engine.enter(name)?;
                visitor.visit_seq(ElementAccess::new(engine, len, Scope::Inherit))
            },
        )
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::Map,
            visitor,
            |value, visitor| value.deserialize_map(visitor),
            |engine, visitor| {
                let len = engine.sequence_len();
                visitor.visit_map(EntryAccess::new(engine, len))
            },
        )
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::Struct { name, fields },
            visitor,
            |value, visitor| value.deserialize_struct(name, fields, visitor),
            |engine, visitor| {
                let engine = engine.enter(name)?;
                visitor.visit_map(FieldAccess::new(engine, fields))
            },
        )
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, StubError> {
        self.resolve(
            Hint::Enum { name, variants },
            visitor,
            |value, visitor| value.deserialize_enum(name, variants, visitor),
            |engine, visitor| {
                let engine = engine.enter(name)?;
                match variants.first() {
                    Some(&variant) => visitor.visit_enum(FirstCase { engine, variant }),
                    None => Err(StubError::UnsupportedEnumShape {
                        type_name: engine.target.unwrap_or(name),
                        shape: EnumShape::NoCases,
                    }),
                }
            },
        )
    }
}

/// Keyed access: every declared field is present.
struct FieldAccess<'a> {
    engine: StubDeserializer<'a>,
    fields: std::slice::Iter<'static, &'static str>,
    pending: Option<&'static str>,
}

impl<'a> FieldAccess<'a> {
    fn new(engine: StubDeserializer<'a>, fields: &'static [&'static str]) -> Self {
        FieldAccess {
            engine,
            fields: fields.iter(),
            pending: None,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for FieldAccess<'a> {
    type Error = StubError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, StubError>
    where
        K: DeserializeSeed<'de>,
    {
        let field = match self.fields.next() {
            Some(&field) => field,
            None => return Ok(None),
        };

        self.pending = Some(field);
        seed.deserialize(BorrowedStrDeserializer::new(field)).map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, StubError>
    where
        V: DeserializeSeed<'de>,
    {
        let field = self
            .pending
            .take()
            .ok_or_else(|| StubError::Custom("field value requested before its key".to_owned()))?;

        seed.deserialize(self.engine.child(
            Some(Locator::Field(field)),
            Some(type_name::<V::Value>()),
            Scope::Inherit,
        ))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len())
    }
}

/// Unkeyed access over a fixed number of elements.
struct ElementAccess<'a> {
    engine: StubDeserializer<'a>,
    len: usize,
    index: usize,
    scope: Scope,
}

impl<'a> ElementAccess<'a> {
    fn new(engine: StubDeserializer<'a>, len: usize, scope: Scope) -> Self {
        ElementAccess {
            engine,
            len,
            index: 0,
            scope,
        }
    }
}

impl<'de, 'a> de::SeqAccess<'de> for ElementAccess<'a> {
    type Error = StubError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>, StubError>
    where
        T: DeserializeSeed<'de>,
    {
        if self.index >= self.len {
            return Ok(None);
        }

        let element = self.engine.child(
            Some(Locator::Index(self.index)),
            Some(type_name::<T::Value>()),
            self.scope,
        );
        self.index += 1;

        seed.deserialize(element).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len - self.index)
    }
}

/// Map access over a fixed number of entries. Keys come from the engine too,
/// so entries whose keys stub to the same value collapse into one.
struct EntryAccess<'a> {
    engine: StubDeserializer<'a>,
    len: usize,
    index: usize,
}

impl<'a> EntryAccess<'a> {
    fn new(engine: StubDeserializer<'a>, len: usize) -> Self {
        EntryAccess {
            engine,
            len,
            index: 0,
        }
    }
}

impl<'de, 'a> de::MapAccess<'de> for EntryAccess<'a> {
    type Error = StubError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>, StubError>
    where
        K: DeserializeSeed<'de>,
    {
        if self.index >= self.len {
            return Ok(None);
        }

        seed.deserialize(self.engine.child(
            Some(Locator::Index(self.index)),
            Some(type_name::<K::Value>()),
            Scope::Fresh,
        ))
        .map(Some)
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value, StubError>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self.engine.child(
            Some(Locator::Index(self.index)),
            Some(type_name::<V::Value>()),
            Scope::Fresh,
        );
        self.index += 1;

        seed.deserialize(value)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len - self.index)
    }
}

/// Enum access that always picks the case at ordinal 0.
struct FirstCase<'a> {
    engine: StubDeserializer<'a>,
    variant: &'static str,
}

impl<'a> FirstCase<'a> {
    fn payload(&self, target: Option<&'static str>) -> StubDeserializer<'a> {
        self.engine
            .child(Some(Locator::Variant(self.variant)), target, Scope::Inherit)
    }
}

impl<'de, 'a> de::EnumAccess<'de> for FirstCase<'a> {
    type Error = StubError;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self), StubError>
    where
        V: DeserializeSeed<'de>,
    {
        let ordinal: U32Deserializer<StubError> = 0u32.into_deserializer();
        let variant = seed.deserialize(ordinal)?;
        Ok((variant, self))
    }
}

impl<'de, 'a> de::VariantAccess<'de> for FirstCase<'a> {
    type Error = StubError;

    fn unit_variant(self) -> Result<(), StubError> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, StubError>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self.payload(Some(type_name::<T::Value>())))
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, StubError> {
        visitor.visit_seq(ElementAccess::new(self.payload(None), len, Scope::Inherit))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, StubError> {
        visitor.visit_map(FieldAccess::new(self.payload(None), fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Config;
    use crate::provider::{CustomStubs, DefaultStubs, EnumCase, EnumCases, EnumStubs, ProviderChain};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use std::collections::{BTreeMap, HashMap};

    fn chain(custom: CustomStubs, enums: EnumStubs) -> ProviderChain {
        let mut chain = ProviderChain::new();
        chain.push(custom);
        chain.push(DefaultStubs::new());
        chain.push(enums);
        chain
    }

    fn stub_in<T: DeserializeOwned>(config: Config, providers: &ProviderChain) -> Result<T, StubError> {
        stub(Context {
            config: &config,
            providers,
        })
    }

    fn stub_with<T: DeserializeOwned>(config: Config) -> Result<T, StubError> {
        stub_in(config, &chain(CustomStubs::new(), EnumStubs::new()))
    }

    fn make<T: DeserializeOwned>() -> Result<T, StubError> {
        stub_with(Config::default())
    }

    fn limits(max_sequence_length: usize, max_depth: usize) -> Config {
        Config {
            max_sequence_length,
            max_depth,
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: i64,
        name: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Crate {
        items: Vec<Item>,
    }

    #[derive(Debug, Deserialize)]
    struct List {
        #[allow(dead_code)]
        next: Box<List>,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Tree {
        children: Vec<Tree>,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Node {
        value: u8,
        next: Option<Box<Node>>,
    }

    #[test]
    fn test_flat_struct() {
        assert_eq!(
            make::<Item>().unwrap(),
            Item {
                id: 33550336,
                name: "This is Stub String".to_owned(),
            }
        );
    }

    #[test]
    fn test_sequence_length() {
        let stub: Crate = stub_with(limits(3, 2)).unwrap();
        assert_eq!(stub.items.len(), 3);
        assert!(stub.items.iter().all(|item| item.id == 33550336));

        let stub: Crate = make().unwrap();
        assert_eq!(stub.items.len(), 60);
    }

    #[test]
    fn test_direct_self_reference() {
        assert_eq!(
            make::<List>().unwrap_err(),
            StubError::Cycle {
                type_name: type_name::<List>()
            }
        );

        // Same answer every time.
        assert_eq!(make::<List>().unwrap_err(), make::<List>().unwrap_err());
    }

    #[test]
    fn test_self_reference_through_sequence() {
        let tree: Tree = make().unwrap();
        assert_eq!(tree.children.len(), 60);
        assert!(tree.children.iter().all(|child| child.children.is_empty()));

        let tree: Tree = stub_with(limits(2, 4)).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[1].children.len(), 2);
        assert!(tree.children[1].children[0].children.is_empty());
    }

    #[test]
    fn test_self_reference_through_option() {
        let node: Node = make().unwrap();
        assert_eq!(
            node,
            Node {
                value: 28,
                next: Some(Box::new(Node {
                    value: 28,
                    next: None
                })),
            }
        );
    }

    #[test]
    fn test_zero_depth() {
        let stub: Crate = stub_with(limits(60, 0)).unwrap();
        assert!(stub.items.is_empty());

        let node: Node = stub_with(limits(60, 0)).unwrap();
        assert_eq!(node.next, None);

        assert_eq!(stub_with::<Option<u32>>(limits(60, 0)).unwrap(), None);
        assert_eq!(stub_with::<Vec<u32>>(limits(60, 0)).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_root_option() {
        assert_eq!(make::<Option<i32>>().unwrap(), Some(33550336));
    }

    #[test]
    fn test_deterministic() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Order {
            id: u64,
            lines: Vec<Item>,
            tags: BTreeMap<String, Vec<u16>>,
            note: Option<String>,
        }

        assert_eq!(make::<Order>().unwrap(), make::<Order>().unwrap());
    }

    #[test]
    fn test_scalars() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Scalars {
            flag: bool,
            small: i8,
            short: u16,
            wide: u128,
            ratio: f32,
            precise: f64,
            glyph: char,
            nothing: (),
        }

        let stub: Scalars = make().unwrap();
        assert!(stub.flag);
        assert_eq!(stub.small, 28);
        assert_eq!(stub.short, 8128);
        assert_eq!(stub.wide, 33550336);
        assert_eq!(stub.ratio, 1.618_034);
        assert_eq!(stub.precise, 1.618_033_988_7);
        assert_eq!(stub.glyph, '🍣');
    }

    #[test]
    fn test_tuples_ignore_sequence_bound() {
        let stub: ([u16; 3], (u8, String)) = stub_with(limits(1, 0)).unwrap();
        assert_eq!(stub.0, [8128, 8128, 8128]);
        assert_eq!(stub.1, (28, "This is Stub String".to_owned()));
    }

    #[test]
    fn test_newtypes() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Meters(f64);

        #[derive(Debug, PartialEq, Deserialize)]
        struct Wrapped(Option<Box<Wrapped>>);

        assert_eq!(make::<Meters>().unwrap(), Meters(1.618_033_988_7));

        // The newtype payload counts as one level of depth.
        assert_eq!(
            make::<Wrapped>().unwrap(),
            Wrapped(Some(Box::new(Wrapped(None))))
        );
    }

    #[test]
    fn test_newtype_cycle() {
        #[derive(Debug, Deserialize)]
        struct Loop(#[allow(dead_code)] Box<Loop>);

        assert_eq!(
            make::<Loop>().unwrap_err(),
            StubError::Cycle {
                type_name: type_name::<Loop>()
            }
        );
    }

    #[test]
    fn test_maps() {
        let stub: HashMap<String, u32> = make().unwrap();
        assert_eq!(stub.len(), 1);
        assert_eq!(stub["This is Stub String"], 33550336);

        let stub: BTreeMap<u8, Vec<bool>> = make().unwrap();
        assert_eq!(stub[&28].len(), 60);

        let stub: BTreeMap<u8, bool> = stub_with(limits(60, 0)).unwrap();
        assert!(stub.is_empty());
    }

    #[test]
    fn test_enums_pick_first_case() {
        #[derive(Debug, PartialEq, Deserialize)]
        enum Status {
            Active,
            Suspended,
        }

        #[derive(Debug, PartialEq, Deserialize)]
        enum Shape {
            Circle { radius: f64 },
            Square(u32),
        }

        #[derive(Debug, PartialEq, Deserialize)]
        enum Pair {
            Both(u8, String),
            Neither,
        }

        assert_eq!(make::<Status>().unwrap(), Status::Active);
        assert_eq!(
            make::<Shape>().unwrap(),
            Shape::Circle {
                radius: 1.618_033_988_7
            }
        );
        assert_eq!(
            make::<Pair>().unwrap(),
            Pair::Both(28, "This is Stub String".to_owned())
        );
    }

    #[test]
    fn test_enum_cycle() {
        #[derive(Debug, Deserialize)]
        enum Chain {
            Next(#[allow(dead_code)] Box<Chain>),
        }

        #[derive(Debug, Deserialize)]
        struct Holder {
            #[allow(dead_code)]
            chains: Vec<Chain>,
        }

        assert_eq!(
            make::<Chain>().unwrap_err(),
            StubError::Cycle {
                type_name: type_name::<Chain>()
            }
        );

        // Starting over inside a sequence does not hide a direct cycle below it.
        assert_eq!(
            make::<Holder>().unwrap_err(),
            StubError::Cycle {
                type_name: type_name::<Chain>()
            }
        );
    }

    #[test]
    fn test_indirect_self_reference_is_bounded() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Outer {
            content: Content,
        }

        #[derive(Debug, PartialEq, Deserialize)]
        struct Content {
            children: Vec<Entry>,
        }

        #[derive(Debug, PartialEq, Deserialize)]
        enum Entry {
            Some(Box<Outer>),
        }

        let outer: Outer = stub_with(limits(1, 2)).unwrap();
        assert_eq!(
            outer,
            Outer {
                content: Content {
                    children: Vec::new()
                }
            }
        );
    }

    #[test]
    fn test_no_cases() {
        #[derive(Debug, Deserialize)]
        enum Never {}

        assert_eq!(
            make::<Never>().unwrap_err(),
            StubError::UnsupportedEnumShape {
                type_name: type_name::<Never>(),
                shape: EnumShape::NoCases,
            }
        );
    }

    #[test]
    fn test_same_name_different_types() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Wrapper<T> {
            inner: T,
        }

        let stub: Wrapper<Wrapper<u8>> = make().unwrap();
        assert_eq!(stub.inner.inner, 28);
    }

    #[test]
    fn test_custom_stub_breaks_cycle() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        enum Chain {
            Next(Box<Chain>),
            End,
        }

        assert!(matches!(
            make::<Chain>(),
            Err(StubError::Cycle { .. })
        ));

        let mut custom = CustomStubs::new();
        custom.insert(&Chain::End).unwrap();
        let providers = chain(custom, EnumStubs::new());

        assert_eq!(
            stub_in::<Vec<Chain>>(limits(2, 2), &providers).unwrap(),
            vec![Chain::End, Chain::End]
        );
    }

    #[test]
    fn test_custom_stub_reaches_nested_values() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Basket {
            first: Item,
            maybe: Option<Item>,
            boxed: Box<Item>,
            rest: Vec<Item>,
        }

        let special = Item {
            id: 7,
            name: "special".to_owned(),
        };

        let mut custom = CustomStubs::new();
        custom.insert(&special).unwrap();
        let providers = chain(custom, EnumStubs::new());

        let basket: Basket = stub_in(limits(2, 2), &providers).unwrap();
        assert_eq!(basket.first, special);
        assert_eq!(basket.maybe, Some(special.clone()));
        assert_eq!(*basket.boxed, special);
        assert_eq!(basket.rest, vec![special.clone(), special]);
    }

    #[test]
    fn test_registered_enum() {
        #[derive(Debug, PartialEq, Serialize)]
        enum Color {
            Red,
            Green,
        }

        // Reads the name itself instead of using the derive.
        impl<'de> Deserialize<'de> for Color {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match String::deserialize(deserializer)?.as_str() {
                    "Red" => Ok(Color::Red),
                    "Green" => Ok(Color::Green),
                    other => Err(de::Error::custom(format!("no such color: {}", other))),
                }
            }
        }

        impl EnumCases for Color {
            fn cases() -> Vec<EnumCase<Self>> {
                vec![EnumCase::Unit(Color::Red), EnumCase::Unit(Color::Green)]
            }
        }

        assert_eq!(
            make::<Color>().unwrap_err(),
            StubError::Custom("no such color: This is Stub String".to_owned())
        );

        let mut enums = EnumStubs::new();
        enums.register::<Color>();
        let providers = chain(CustomStubs::new(), enums);
        assert_eq!(stub_in::<Color>(Config::default(), &providers).unwrap(), Color::Red);
    }

    #[test]
    fn test_enum_shape_surfaces_when_nothing_else_resolves() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        enum Link {
            Next(Box<Link>),
        }

        impl EnumCases for Link {
            fn cases() -> Vec<EnumCase<Self>> {
                vec![EnumCase::WithData("Next")]
            }
        }

        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        enum Event {
            Select(u8),
        }

        impl EnumCases for Event {
            fn cases() -> Vec<EnumCase<Self>> {
                vec![EnumCase::WithData("Select")]
            }
        }

        let mut enums = EnumStubs::new();
        enums.register::<Link>();
        enums.register::<Event>();
        let providers = chain(CustomStubs::new(), enums);

        // Structural decoding still handles the payload case.
        assert_eq!(
            stub_in::<Event>(Config::default(), &providers).unwrap(),
            Event::Select(28)
        );

        assert_eq!(
            stub_in::<Link>(Config::default(), &providers).unwrap_err(),
            StubError::UnsupportedEnumShape {
                type_name: type_name::<Link>(),
                shape: EnumShape::DataCarrying { case: "Next" },
            }
        );
    }

    #[test]
    fn test_own_errors_propagate() {
        #[derive(Debug)]
        struct Picky;

        impl<'de> Deserialize<'de> for Picky {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let n = u32::deserialize(deserializer)?;
                Err(de::Error::custom(format!("{} is too large", n)))
            }
        }

        #[derive(Debug, Deserialize)]
        struct Outer {
            #[allow(dead_code)]
            picky: Vec<Picky>,
        }

        assert_eq!(
            make::<Outer>().unwrap_err(),
            StubError::Custom("33550336 is too large".to_owned())
        );
    }

    #[test]
    fn test_hand_written_string_type() {
        #[derive(Debug, PartialEq)]
        struct Slug(String);

        impl<'de> Deserialize<'de> for Slug {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Ok(Slug(raw.to_lowercase().replace(' ', "-")))
            }
        }

        assert_eq!(
            make::<Slug>().unwrap(),
            Slug("this-is-stub-string".to_owned())
        );
    }

    #[test]
    fn test_well_known_types() {
        #[derive(Debug, Deserialize)]
        struct Visit {
            at: DateTime<Utc>,
            from: std::net::IpAddr,
        }

        let visit: Visit = make().unwrap();
        assert_eq!(visit.at.timestamp(), 33550336);
        assert!(visit.from.is_loopback());
    }

    #[test]
    fn test_newtype_payload_uses_providers() {
        #[derive(Debug, Deserialize)]
        struct Stamp(DateTime<Utc>);

        #[derive(Debug, PartialEq, Deserialize)]
        struct Wrap(Item);

        assert_eq!(make::<Stamp>().unwrap().0.timestamp(), 33550336);

        let special = Item {
            id: 7,
            name: "special".to_owned(),
        };

        let mut custom = CustomStubs::new();
        custom.insert(&special).unwrap();
        let providers = chain(custom, EnumStubs::new());

        assert_eq!(
            stub_in::<Wrap>(Config::default(), &providers).unwrap(),
            Wrap(special)
        );
    }

    mod outer {
        use serde::Deserialize;

        #[derive(Debug, Deserialize)]
        pub struct Config {
            pub inner: Wrapper,
        }

        #[derive(Debug, Deserialize)]
        pub struct Wrapper(pub super::inner::Config);
    }

    mod inner {
        use serde::Deserialize;

        #[derive(Debug, Deserialize)]
        pub struct Config {
            pub x: u8,
        }
    }

    #[test]
    fn test_same_name_in_other_module() {
        let config: outer::Config = make().unwrap();
        assert_eq!(config.inner.0.x, 28);
    }

    #[test]
    fn test_transparent_optional_self_reference() {
        #[derive(Debug, Deserialize)]
        #[serde(transparent)]
        struct Chain {
            #[allow(dead_code)]
            next: Option<Box<Chain>>,
        }

        assert_eq!(
            make::<Chain>().unwrap_err(),
            StubError::Cycle {
                type_name: type_name::<Chain>()
            }
        );

        // Out of depth the option is simply absent.
        assert!(stub_with::<Chain>(limits(60, 0)).unwrap().next.is_none());
    }

    #[test]
    fn test_nested_options() {
        assert_eq!(make::<Option<Option<u8>>>().unwrap(), Some(Some(28)));
    }

    #[test]
    fn test_own_errors_win_over_enum_shape() {
        #[derive(Debug)]
        struct Picky;

        impl<'de> Deserialize<'de> for Picky {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let n = u8::deserialize(deserializer)?;
                Err(de::Error::custom(format!("{} is not allowed", n)))
            }
        }

        impl Serialize for Picky {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u8(0)
            }
        }

        #[derive(Debug, Serialize, Deserialize)]
        enum Event {
            Select(Picky),
        }

        impl EnumCases for Event {
            fn cases() -> Vec<EnumCase<Self>> {
                vec![EnumCase::WithData("Select")]
            }
        }

        let mut enums = EnumStubs::new();
        enums.register::<Event>();
        let providers = chain(CustomStubs::new(), enums);

        assert_eq!(
            stub_in::<Event>(Config::default(), &providers).unwrap_err(),
            StubError::Custom("28 is not allowed".to_owned())
        );
    }
}
