//! TeamCity locator builder.
//!
//! A locator is the REST API's filter mini-language: a comma-separated list of
//! `name:value` clauses, where a value may itself be a parenthesized
//! sub-locator, e.g. `project:(id:Foo),paused:false`.
//!
//! Clauses are kept in insertion order and rendered verbatim. Nothing is
//! escaped; a value that needs nesting must be built as a [`Locator`] and
//! passed as [`LocatorValue::Nested`].

use std::fmt;

/// The value half of a locator clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorValue {
    /// Rendered as-is.
    Literal(String),
    /// Rendered as `(<inner locator>)`.
    Nested(Locator),
}

impl fmt::Display for LocatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocatorValue::Literal(s) => f.write_str(s),
            LocatorValue::Nested(inner) => write!(f, "({inner})"),
        }
    }
}

impl From<&str> for LocatorValue {
    fn from(value: &str) -> Self {
        LocatorValue::Literal(value.to_string())
    }
}

impl From<String> for LocatorValue {
    fn from(value: String) -> Self {
        LocatorValue::Literal(value)
    }
}

impl From<&String> for LocatorValue {
    fn from(value: &String) -> Self {
        LocatorValue::Literal(value.clone())
    }
}

impl From<bool> for LocatorValue {
    fn from(value: bool) -> Self {
        LocatorValue::Literal(value.to_string())
    }
}

impl From<Locator> for LocatorValue {
    fn from(value: Locator) -> Self {
        LocatorValue::Nested(value)
    }
}

macro_rules! literal_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for LocatorValue {
                fn from(value: $t) -> Self {
                    LocatorValue::Literal(value.to_string())
                }
            }
        )*
    };
}

literal_from_int!(i32, i64, u32, u64, usize);

/// One `name:value` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub name: String,
    pub value: LocatorValue,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.value)
    }
}

/// An ordered sequence of predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locator {
    predicates: Vec<Predicate>,
}

impl Locator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sub-locator selecting a single entity by id: `(id:<id>)`.
    #[must_use]
    pub fn by_id(id: impl Into<LocatorValue>) -> Self {
        Self::new().with("id", id)
    }

    /// Append a clause. Repeated names are kept.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<LocatorValue>) -> &mut Self {
        self.predicates.push(Predicate {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Consuming variant of [`Locator::add`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<LocatorValue>) -> Self {
        self.add(name, value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Top-level predicate names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.iter().map(|p| p.name.as_str())
    }

    /// Render as `name:value,name:value`. Empty locators render `""`.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{predicate}")?;
        }
        Ok(())
    }
}
