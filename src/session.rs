use crate::context::{Config, Context};
use crate::de;
use crate::error::StubError;
use crate::inject::Injector;
use crate::provider::{
    first_match, CustomStubs, DefaultStubs, EnumCases, EnumStubs, ProviderChain, Request,
    StubProvider,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::type_name;
use tracing::debug;

/// Limits and providers for making stubs.
///
/// Providers are consulted in this order: those added with
/// [`Session::prepend_provider`], registered stubs ([`Session::stub`]), the
/// built-in defaults, registered enums ([`Session::enum_cases`]), and last
/// those added with [`Session::append_provider`].
///
/// A session is only read while making stubs, so one session can serve any
/// number of threads at once.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use serde_stub::Session;
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Money {
///     cents: u64,
///     currency: String,
/// }
///
/// #[derive(Debug, Deserialize)]
/// struct Invoice {
///     total: Money,
///     lines: Vec<Money>,
/// }
///
/// let session = Session::new()
///     .max_sequence_length(2)
///     .stub(&Money { cents: 995, currency: "EUR".to_owned() })
///     .unwrap();
///
/// let invoice: Invoice = session.make().unwrap();
/// assert_eq!(invoice.total.cents, 995);
/// assert_eq!(invoice.lines.len(), 2);
/// ```
#[derive(Default)]
pub struct Session {
    config: Config,
    custom: CustomStubs,
    defaults: DefaultStubs,
    enums: EnumStubs,
    leading: ProviderChain,
    trailing: ProviderChain,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Session {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.config.max_sequence_length = max_sequence_length;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Uses `value` wherever a `T` is requested.
    pub fn stub<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, StubError> {
        self.custom.insert(value)?;
        Ok(self)
    }

    /// Uses an already-serialized value wherever a `T` is requested.
    pub fn stub_value<T: ?Sized>(mut self, value: Value) -> Self {
        self.custom.insert_value::<T>(value);
        self
    }

    /// Resolves `E` to its first declared case.
    pub fn enum_cases<E: EnumCases>(mut self) -> Self {
        self.enums.register::<E>();
        self
    }

    /// Consults `provider` before anything else.
    pub fn prepend_provider<P: StubProvider + 'static>(mut self, provider: P) -> Self {
        self.leading.prepend(provider);
        self
    }

    /// Consults `provider` only when nothing else answers.
    pub fn append_provider<P: StubProvider + 'static>(mut self, provider: P) -> Self {
        self.trailing.push(provider);
        self
    }

    pub fn custom_stubs(&self) -> &CustomStubs {
        &self.custom
    }

    pub fn custom_stubs_mut(&mut self) -> &mut CustomStubs {
        &mut self.custom
    }

    /// Makes a stub `T`.
    pub fn make<T: DeserializeOwned>(&self) -> Result<T, StubError> {
        self.config.validate()?;

        debug!(
            type_name = type_name::<T>(),
            max_sequence_length = self.config.max_sequence_length,
            max_depth = self.config.max_depth,
            "stub: making instance"
        );

        let resolvers = self.resolvers();
        de::stub(Context {
            config: &self.config,
            providers: &resolvers,
        })
    }

    /// Makes a stub `T`, then applies the overrides `configure` registers.
    pub fn make_with<T, F>(&self, configure: F) -> Result<T, StubError>
    where
        T: DeserializeOwned + 'static,
        F: FnOnce(&mut Injector<T>),
    {
        let instance = self.make::<T>()?;

        let mut injector = Injector::new();
        configure(&mut injector);
        injector.apply(instance)
    }

    fn resolvers(&self) -> Resolvers<'_> {
        Resolvers([
            &self.leading,
            &self.custom,
            &self.defaults,
            &self.enums,
            &self.trailing,
        ])
    }
}

struct Resolvers<'s>([&'s dyn StubProvider; 5]);

impl StubProvider for Resolvers<'_> {
    fn provide(&self, request: &Request<'_>) -> Result<Option<Value>, StubError> {
        first_match(self.0.iter().copied(), request)
    }
}
