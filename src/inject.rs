use crate::error::StubError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

type Apply<T> = Box<dyn FnOnce(&mut T) -> Result<(), StubError>>;

struct Override<T> {
    locator: Option<String>,
    apply: Apply<T>,
}

/// Overrides to apply to a freshly made stub, in registration order.
///
/// Fields reachable from the caller are set through an accessor with
/// [`Injector::set`]. Fields that are not (private fields, fields of types
/// from another crate) are set by name with [`Injector::set_field`], which
/// goes through the type's own serialized form.
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
///     item.set_field("name", "seven");
/// })
/// .unwrap();
///
/// assert_eq!(item.id, 7);
/// assert_eq!(item.name, "seven");
/// ```
pub struct Injector<T> {
    overrides: Vec<Override<T>>,
}

impl<T: 'static> Default for Injector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Injector<T> {
    pub fn new() -> Self {
        Injector {
            overrides: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Sets the field `field` points at to `value`.
    pub fn set<U, F>(&mut self, field: F, value: U) -> &mut Self
    where
        U: 'static,
        F: FnOnce(&mut T) -> &mut U + 'static,
    {
        self.overrides.push(Override {
            locator: None,
            apply: Box::new(move |instance: &mut T| {
                *field(instance) = value;
                Ok(())
            }),
        });
        self
    }

    /// Sets the field at `locator` to `value`.
    ///
    /// `locator` is either a dotted path (`address.city`, `lines.0.sku`) or a
    /// JSON pointer (`/address/city`). It names fields as they appear in the
    /// serialized form, so renamed fields go by their serialized name.
    /// Locators that do not name an existing field fail with
    /// [`StubError::UnsupportedField`] when the override is applied.
    ///
    /// The whole instance is rebuilt from its serialized form. A type whose
    /// serialized form does not rebuild it as it was fails with
    /// `UnsupportedField` rather than losing data. Fields the type never
    /// serializes (`#[serde(skip)]`) cannot be told apart from the rest and
    /// come back as their `Default`; set those through [`Injector::set`].
    pub fn set_field<U>(&mut self, locator: &str, value: U) -> &mut Self
    where
        T: Serialize + DeserializeOwned,
        U: Serialize,
    {
        let value = serde_json::to_value(value);
        let name = locator.to_owned();

        self.overrides.push(Override {
            locator: Some(locator.to_owned()),
            apply: Box::new(move |instance: &mut T| overwrite(instance, &name, value?)),
        });
        self
    }

    /// Applies every override to `instance`, stopping at the first failure.
    pub fn apply(self, mut instance: T) -> Result<T, StubError> {
        for Override { locator, apply } in self.overrides {
            apply(&mut instance)?;
            trace!(
                locator = locator.as_deref().unwrap_or("<accessor>"),
                "stub: applied override"
            );
        }

        Ok(instance)
    }
}

fn overwrite<T>(instance: &mut T, locator: &str, value: Value) -> Result<(), StubError>
where
    T: Serialize + DeserializeOwned,
{
    let unsupported = || StubError::UnsupportedField {
        locator: locator.to_owned(),
    };

    let pointer = pointer(locator).ok_or_else(unsupported)?;
    let mut document = serde_json::to_value(&*instance).map_err(|_| unsupported())?;

    // Untouched, the document has to rebuild an instance that serializes the
    // same way, or the write below would change more than the one field.
    let rebuilt: T = serde_json::from_value(document.clone()).map_err(|_| unsupported())?;
    if serde_json::to_value(&rebuilt).map_err(|_| unsupported())? != document {
        return Err(unsupported());
    }

    let slot = document.pointer_mut(&pointer).ok_or_else(unsupported)?;
    *slot = value;

    *instance = serde_json::from_value(document)?;
    Ok(())
}

// Converts a dotted path to a JSON pointer. The empty locator would address
// the whole instance rather than a field.
fn pointer(locator: &str) -> Option<String> {
    if locator.is_empty() || locator == "/" {
        return None;
    }

    if locator.starts_with('/') {
        return Some(locator.to_owned());
    }

    let mut pointer = String::new();
    for segment in locator.split('.') {
        pointer.push('/');
        pointer.push_str(&segment.replace('~', "~0").replace('/', "~1"));
    }

    Some(pointer)
}
