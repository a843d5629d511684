//! Generate stub instances of `Deserialize` types for tests.
//!
//! # Quick start
//!
//! Here's how you can use [`make`] to get a value of a type without writing
//! it out by hand.
//!
//! ```
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Item {
//!     id: i64,
//!     name: String,
//!     tags: Vec<String>,
//!     parent: Option<Box<Item>>,
//! }
//!
//! let item: Item = serde_stub::make().unwrap();
//!
//! assert_eq!(item.id, 33550336);
//! assert_eq!(item.name, "This is Stub String");
//! assert_eq!(item.tags.len(), 60);
//!
//! // Optionals and sequences run out once the depth limit is reached.
//! let parent = item.parent.unwrap();
//! assert!(parent.tags.is_empty());
//! assert!(parent.parent.is_none());
//! ```

mod context;
mod de;
mod error;
mod inject;
pub mod provider;
mod session;

pub use context::{Config, Locator, Path, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SEQUENCE_LENGTH};
pub use error::{EnumShape, StubError};
pub use inject::Injector;
pub use provider::{
    type_key, CustomStubs, DefaultStubs, EnumCase, EnumCases, EnumStubs, Hint, ProviderChain,
    Request, StubProvider,
};
pub use session::Session;

use serde::de::DeserializeOwned;

/// Makes a stub `T` with the default limits and providers.
///
/// The output is purely a function of `T` and the session it is made in:
/// making the same type twice gives equal values.
///
/// # Invariants for generated data
///
/// The output of this function is not guaranteed to remain the same between
/// different versions of this crate. For this version:
///
/// * Every declared field is present. Integers are perfect numbers (28, 8128
///   or 33550336 depending on width), floats are the golden ratio, strings are
///   `"This is Stub String"` and characters are `'🍣'`.
///
/// * Sequences hold [`DEFAULT_MAX_SEQUENCE_LENGTH`] elements, and
///   optionals are present, until they are [`DEFAULT_MAX_DEPTH`] steps below
///   the root. From there on sequences and maps are empty and optionals are
///   absent. Tuples and arrays always have their declared length.
///
/// * Map keys are stubbed like any other value, so keys of one type all come
///   out equal and a map ends up with at most one entry (a
///   `HashMap<String, _>` holds just `"This is Stub String"`).
///
/// * Newtype structs are stubbed through their payload type, so a provider or
///   registered stub for the wrapped type applies inside the wrapper.
///
/// * Enums resolve to their first declared case.
///
/// * Dates and times are 33550336 seconds after the Unix epoch; addresses are
///   the loopback address.
///
/// # Errors
///
/// A type that contains itself other than through a sequence, map or optional
/// has no finite stub, and fails with [`StubError::Cycle`]. Register a stub
/// for it with [`Session::stub`] to use it anyway.
pub fn make<T: DeserializeOwned>() -> Result<T, StubError> {
    Session::new().make()
}

/// Makes a stub `T` with the default limits and providers, then applies the
/// overrides `configure` registers.
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Item {
///     id: i64,
///     name: String,
/// }
///
/// let item: Item = serde_stub::make_with(|item| {
///     item.set(|item: &mut Item| &mut item.id, 7);
/// })
/// .unwrap();
///
/// assert_eq!(item.id, 7);
/// assert_eq!(item.name, "This is Stub String");
/// ```
pub fn make_with<T, F>(configure: F) -> Result<T, StubError>
where
    T: DeserializeOwned + 'static,
    F: FnOnce(&mut Injector<T>),
{
    Session::new().make_with(configure)
}
