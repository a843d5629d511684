use crate::error::StubError;
use crate::provider::StubProvider;
use serde::{Deserialize, Serialize};
use std::fmt;

// Number of elements generated for sequences and maps while the depth budget
// allows them to be populated at all.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 60;

// Number of path segments below the root at which sequences come out empty
// and optionals come out absent.
pub const DEFAULT_MAX_DEPTH: usize = 2;

/// Limits that keep stub generation finite.
///
/// ```
/// let config: serde_stub::Config =
///     serde_json::from_value(serde_json::json!({ "maxDepth": 4 })).unwrap();
///
/// assert_eq!(config.max_depth, 4);
/// assert_eq!(config.max_sequence_length, 60);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    pub max_sequence_length: usize,
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), StubError> {
        if self.max_sequence_length == 0 {
            return Err(StubError::InvalidConfig(
                "max_sequence_length must be positive",
            ));
        }

        Ok(())
    }

    /// Number of elements a sequence or map at `path` is given.
    pub fn sequence_len(&self, path: &Path) -> usize {
        if path.len() >= self.max_depth {
            0
        } else {
            self.max_sequence_length
        }
    }

    /// Whether an optional at `path` resolves to absent.
    pub fn is_absent(&self, path: &Path) -> bool {
        path.len() >= self.max_depth
    }
}

/// One step from a value to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Field(&'static str),
    Index(usize),
    Variant(&'static str),
}

/// Location of a value relative to the root of the stub being built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Locator>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn locators(&self) -> &[Locator] {
        &self.0
    }

    pub fn last(&self) -> Option<&Locator> {
        self.0.last()
    }

    pub(crate) fn join(&self, locator: Locator) -> Path {
        let mut locators = Vec::with_capacity(self.0.len() + 1);
        locators.extend_from_slice(&self.0);
        locators.push(locator);
        Path(locators)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        for (i, locator) in self.0.iter().enumerate() {
            match locator {
                Locator::Field(name) if i == 0 => write!(f, "{}", name)?,
                Locator::Field(name) => write!(f, ".{}", name)?,
                Locator::Index(index) => write!(f, "[{}]", index)?,
                Locator::Variant(name) => write!(f, "::{}", name)?,
            }
        }

        Ok(())
    }
}

/// What every engine in one call tree reads from: the limits and the
/// providers to consult before recursing.
#[derive(Clone, Copy)]
pub(crate) struct Context<'a> {
    pub config: &'a Config,
    pub providers: &'a dyn StubProvider,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_sequence_length, 60);
        assert_eq!(config.max_depth, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config: Config = serde_json::from_value(json!({
            "maxSequenceLength": 3,
            "maxDepth": 0,
        }))
        .unwrap();

        assert_eq!(
            config,
            Config {
                max_sequence_length: 3,
                max_depth: 0
            }
        );

        assert!(serde_json::from_value::<Config>(json!({ "depth": 1 })).is_err());
    }

    #[test]
    fn test_validate() {
        let config = Config {
            max_sequence_length: 0,
            max_depth: 2,
        };

        assert!(matches!(
            config.validate(),
            Err(StubError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let config = Config::default();
        let root = Path::root();
        let one = root.join(Locator::Field("items"));
        let two = one.join(Locator::Index(0));

        assert_eq!(config.sequence_len(&root), 60);
        assert_eq!(config.sequence_len(&one), 60);
        assert_eq!(config.sequence_len(&two), 0);

        assert!(!config.is_absent(&one));
        assert!(config.is_absent(&two));

        let flat = Config {
            max_sequence_length: 60,
            max_depth: 0,
        };
        assert_eq!(flat.sequence_len(&root), 0);
        assert!(flat.is_absent(&root));
    }

    #[test]
    fn test_path_display() {
        let path = Path::root()
            .join(Locator::Field("items"))
            .join(Locator::Index(2))
            .join(Locator::Field("status"))
            .join(Locator::Variant("Active"));

        assert_eq!(path.to_string(), "items[2].status::Active");
        assert_eq!(Path::root().to_string(), "<root>");
    }
}
