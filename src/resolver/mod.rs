//! Resolvers turn evaluated values into content that can be placed in the
//! document.
//!
//! Resolvers form a chain of responsibility: [`ResolverChain::resolve`] asks
//! each registered [`ObjectResolver`] in order whether it accepts the value,
//! and the first that does produces the content. When no resolver accepts
//! the value the chain fails with [`Error::NoResolverFound`].
//!
//! # Example
//!
//! ```
//! use docstamp::resolver::{ObjectResolver, Resolution, ResolveContext, ResolverChain};
//! use docstamp::expression::Placeholder;
//! use docstamp::{StampConfig, Value};
//! use std::sync::Arc;
//!
//! struct Shout;
//!
//! impl ObjectResolver for Shout {
//!     fn name(&self) -> &str {
//!         "shout"
//!     }
//!
//!     fn can_resolve(&self, value: &Value) -> bool {
//!         matches!(value, Value::String(_))
//!     }
//!
//!     fn resolve(
//!         &self,
//!         _context: &ResolveContext<'_>,
//!         _placeholder: &Placeholder,
//!         value: &Value,
//!     ) -> docstamp::Result<Resolution> {
//!         Ok(Resolution::text(value.to_string().to_uppercase()))
//!     }
//! }
//!
//! let mut chain = ResolverChain::new();
//! chain.register(Arc::new(Shout));
//!
//! let config = StampConfig::default();
//! let context = ResolveContext::new(&config);
//! let placeholder = Placeholder("${name}".into());
//! let resolved = chain.resolve(&context, &placeholder, &Value::from("hi")).unwrap();
//! assert_eq!(resolved.text_content(), "HI");
//! ```

mod builtin;

pub use builtin::{DateResolver, NullResolver, StringResolver, ToStringResolver};

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::expression::Placeholder;
use crate::model::{Run, RunContent};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Information available to a resolver.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Active configuration
    pub config: &'a StampConfig,
}

impl<'a> ResolveContext<'a> {
    /// Create a context over a configuration.
    pub fn new(config: &'a StampConfig) -> Self {
        Self { config }
    }
}

/// Content produced by a resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Content items that go into the placeholder's run, which keeps the
    /// style of the surrounding text
    Content(Vec<RunContent>),
    /// A complete run that replaces the placeholder's run, style included
    Run(Run),
}

impl Resolution {
    /// Plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Resolution::Content(vec![RunContent::Text(text.into())])
    }

    /// Text of the resolved content.
    pub fn text_content(&self) -> String {
        let items = match self {
            Resolution::Content(items) => items,
            Resolution::Run(run) => &run.content,
        };
        items
            .iter()
            .filter_map(|item| match item {
                RunContent::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Converts a runtime value into document content.
pub trait ObjectResolver: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Check if this resolver handles `value`.
    fn can_resolve(&self, value: &Value) -> bool;

    /// Produce content for `value`, found at `placeholder`.
    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        placeholder: &Placeholder,
        value: &Value,
    ) -> Result<Resolution>;
}

/// Ordered chain of resolvers. Earlier registrations win.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn ObjectResolver>>,
}

impl ResolverChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain holding the built-in resolvers: null, date, string,
    /// and the stringify fallback, in that order.
    pub fn with_defaults() -> Self {
        let mut chain = Self::new();
        chain.register_defaults();
        chain
    }

    /// Append the built-in resolvers.
    pub fn register_defaults(&mut self) {
        self.register(Arc::new(NullResolver));
        self.register(Arc::new(DateResolver));
        self.register(Arc::new(StringResolver));
        self.register(Arc::new(ToStringResolver));
    }

    /// Append a resolver at the lowest priority.
    pub fn register(&mut self, resolver: Arc<dyn ObjectResolver>) {
        self.resolvers.push(resolver);
    }

    /// Number of registered resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Names of the registered resolvers, in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve `value` with the first resolver that accepts it.
    pub fn resolve(
        &self,
        context: &ResolveContext<'_>,
        placeholder: &Placeholder,
        value: &Value,
    ) -> Result<Resolution> {
        let resolver = self
            .resolvers
            .iter()
            .find(|r| r.can_resolve(value))
            .ok_or_else(|| Error::NoResolverFound {
                placeholder: placeholder.to_string(),
                kind: value.kind().to_string(),
            })?;
        log::trace!("{} resolved by {}", placeholder, resolver.name());
        resolver.resolve(context, placeholder, value)
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Split `text` into content items, turning each occurrence of the
/// line-break literal into a line break.
pub(crate) fn text_content(text: &str, line_break: Option<&str>) -> Vec<RunContent> {
    let Some(literal) = line_break.filter(|l| !l.is_empty()) else {
        return vec![RunContent::Text(text.to_string())];
    };

    let mut items = Vec::new();
    for (i, part) in text.split(literal).enumerate() {
        if i > 0 {
            items.push(RunContent::LineBreak);
        }
        if !part.is_empty() {
            items.push(RunContent::Text(part.to_string()));
        }
    }
    if items.is_empty() {
        items.push(RunContent::Text(String::new()));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        name: &'static str,
        hits: Arc<AtomicUsize>,
    }

    impl ObjectResolver for Counting {
        fn name(&self) -> &str {
            self.name
        }

        fn can_resolve(&self, _value: &Value) -> bool {
            true
        }

        fn resolve(
            &self,
            _context: &ResolveContext<'_>,
            _placeholder: &Placeholder,
            _value: &Value,
        ) -> Result<Resolution> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(Resolution::text(self.name))
        }
    }

    #[test]
    fn test_first_registered_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut chain = ResolverChain::new();
        chain.register(Arc::new(Counting {
            name: "r1",
            hits: first.clone(),
        }));
        chain.register(Arc::new(Counting {
            name: "r2",
            hits: second.clone(),
        }));

        let config = StampConfig::default();
        let context = ResolveContext::new(&config);
        let placeholder = Placeholder("${x}".into());
        for value in [Value::Null, Value::Int(1), Value::from("s")] {
            let resolved = chain.resolve(&context, &placeholder, &value).unwrap();
            assert_eq!(resolved.text_content(), "r1");
        }
        assert_eq!(first.load(Ordering::SeqCst), 3);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_chain_fails() {
        let chain = ResolverChain::new();
        let config = StampConfig::default();
        let err = chain
            .resolve(
                &ResolveContext::new(&config),
                &Placeholder("${x}".into()),
                &Value::Int(1),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NoResolverFound { ref kind, .. } if kind == "int"));
    }

    #[test]
    fn test_default_order() {
        let chain = ResolverChain::with_defaults();
        assert_eq!(chain.names(), vec!["null", "date", "string", "to-string"]);
    }

    #[test]
    fn test_text_content_line_breaks() {
        assert_eq!(
            text_content("a<br>b", Some("<br>")),
            vec![
                RunContent::Text("a".into()),
                RunContent::LineBreak,
                RunContent::Text("b".into())
            ]
        );
        assert_eq!(text_content("plain", None), vec![RunContent::Text("plain".into())]);
        assert_eq!(text_content("<br>", Some("<br>")), vec![RunContent::LineBreak]);
    }
}
