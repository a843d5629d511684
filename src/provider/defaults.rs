use super::{type_key, Request, StubProvider};
use crate::error::StubError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

pub const BOOL: bool = true;
pub const I8: i8 = 28;
pub const I16: i16 = 8128;
pub const I32: i32 = 33_550_336;
pub const I64: i64 = 33_550_336;
pub const U8: u8 = 28;
pub const U16: u16 = 8128;
pub const U32: u32 = 33_550_336;
pub const U64: u64 = 33_550_336;
pub const F32: f32 = 1.618_034;
pub const F64: f64 = 1.618_033_988_7;
pub const CHAR: char = '🍣';
pub const STRING: &str = "This is Stub String";

// Seconds after the Unix epoch used for every date and time type.
pub const TIMESTAMP: i64 = 33_550_336;

pub const PORT: u16 = 8128;

type Stub = fn() -> Option<Value>;

/// Fixed stubs for primitive types, plus a handful of well-known types whose
/// string forms have to parse (timestamps, addresses).
///
/// Entries are keyed by type. A type with its own `Deserialize` impl that asks
/// for, say, a string is not answered here directly; the engine then resolves
/// the string itself, which lands here as a request for `String`.
pub struct DefaultStubs {
    stubs: HashMap<&'static str, Stub>,
}

impl Default for DefaultStubs {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultStubs {
    pub fn new() -> Self {
        let mut stubs: HashMap<&'static str, Stub> = HashMap::new();

        stubs.insert(type_key::<bool>(), || Some(Value::from(BOOL)));
        stubs.insert(type_key::<i8>(), || Some(Value::from(I8)));
        stubs.insert(type_key::<i16>(), || Some(Value::from(I16)));
        stubs.insert(type_key::<i32>(), || Some(Value::from(I32)));
        stubs.insert(type_key::<i64>(), || Some(Value::from(I64)));
        stubs.insert(type_key::<isize>(), || Some(Value::from(I64)));
        stubs.insert(type_key::<u8>(), || Some(Value::from(U8)));
        stubs.insert(type_key::<u16>(), || Some(Value::from(U16)));
        stubs.insert(type_key::<u32>(), || Some(Value::from(U32)));
        stubs.insert(type_key::<u64>(), || Some(Value::from(U64)));
        stubs.insert(type_key::<usize>(), || Some(Value::from(U64)));
        // serde_json numbers top out at 64 bits; the 128-bit stubs share the
        // 64-bit values.
        stubs.insert(type_key::<i128>(), || Some(Value::from(I64)));
        stubs.insert(type_key::<u128>(), || Some(Value::from(U64)));
        stubs.insert(type_key::<f32>(), || Some(Value::from(F32)));
        stubs.insert(type_key::<f64>(), || Some(Value::from(F64)));
        stubs.insert(type_key::<char>(), || Some(Value::from(CHAR.to_string())));
        stubs.insert(type_key::<str>(), || Some(Value::from(STRING)));
        stubs.insert(type_key::<String>(), || Some(Value::from(STRING)));
        stubs.insert(type_key::<[u8]>(), || Some(Value::from(STRING)));
        stubs.insert(type_key::<()>(), || Some(Value::Null));

        stubs.insert(type_key::<DateTime<Utc>>(), || serialized(instant()));
        stubs.insert(type_key::<DateTime<FixedOffset>>(), || {
            let offset = FixedOffset::east_opt(0)?;
            serialized(instant().map(|instant| instant.with_timezone(&offset)))
        });
        stubs.insert(type_key::<NaiveDateTime>(), || {
            serialized(instant().map(|instant| instant.naive_utc()))
        });
        stubs.insert(type_key::<NaiveDate>(), || {
            serialized(instant().map(|instant| instant.date_naive()))
        });
        stubs.insert(type_key::<NaiveTime>(), || {
            serialized(instant().map(|instant| instant.time()))
        });

        stubs.insert(type_key::<IpAddr>(), || {
            serialized(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)))
        });
        stubs.insert(type_key::<Ipv4Addr>(), || serialized(Some(Ipv4Addr::LOCALHOST)));
        stubs.insert(type_key::<Ipv6Addr>(), || serialized(Some(Ipv6Addr::LOCALHOST)));
        stubs.insert(type_key::<SocketAddr>(), || {
            serialized(Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), PORT)))
        });

        DefaultStubs { stubs }
    }
}

fn instant() -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(TIMESTAMP, 0)
}

fn serialized<T: Serialize>(value: Option<T>) -> Option<Value> {
    serde_json::to_value(value?).ok()
}

impl StubProvider for DefaultStubs {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        Ok(request
            .type_name()
            .and_then(|name| self.stubs.get(name))
            .and_then(|stub| stub()))
    }
}
