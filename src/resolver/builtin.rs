//! Built-in resolvers.

use super::{text_content, ObjectResolver, Resolution, ResolveContext};
use crate::config::NullPolicy;
use crate::error::{Error, Result};
use crate::expression::Placeholder;
use crate::value::Value;
use std::fmt::Write;

/// Renders `null` according to the configured [`NullPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl ObjectResolver for NullResolver {
    fn name(&self) -> &str {
        "null"
    }

    fn can_resolve(&self, value: &Value) -> bool {
        value.is_null()
    }

    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        placeholder: &Placeholder,
        _value: &Value,
    ) -> Result<Resolution> {
        let text = match &context.config.null_policy {
            NullPolicy::Echo => placeholder.as_str(),
            NullPolicy::Empty => "",
            NullPolicy::Text(text) => text.as_str(),
        };
        Ok(Resolution::text(text))
    }
}

/// Formats dates and date-times with the configured chrono format strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateResolver;

impl ObjectResolver for DateResolver {
    fn name(&self) -> &str {
        "date"
    }

    fn can_resolve(&self, value: &Value) -> bool {
        matches!(value, Value::Date(_) | Value::DateTime(_))
    }

    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        placeholder: &Placeholder,
        value: &Value,
    ) -> Result<Resolution> {
        let mut out = String::new();
        let written = match value {
            Value::Date(d) => write!(out, "{}", d.format(&context.config.date_format)),
            Value::DateTime(dt) => write!(out, "{}", dt.format(&context.config.date_time_format)),
            other => write!(out, "{}", other),
        };
        written.map_err(|_| {
            Error::evaluation(
                placeholder.as_str(),
                format!("invalid date format for {}", value.kind()),
            )
        })?;
        Ok(Resolution::text(out))
    }
}

/// Inserts strings, honouring the line-break placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringResolver;

impl ObjectResolver for StringResolver {
    fn name(&self) -> &str {
        "string"
    }

    fn can_resolve(&self, value: &Value) -> bool {
        matches!(value, Value::String(_))
    }

    fn resolve(
        &self,
        context: &ResolveContext<'_>,
        _placeholder: &Placeholder,
        value: &Value,
    ) -> Result<Resolution> {
        let text = value.as_str().unwrap_or_default();
        Ok(Resolution::Content(text_content(
            text,
            context.config.line_break_placeholder.as_deref(),
        )))
    }
}

/// Fallback that stringifies any scalar, list or map.
///
/// Table data has no inline text form and is left to the table directive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToStringResolver;

impl ObjectResolver for ToStringResolver {
    fn name(&self) -> &str {
        "to-string"
    }

    fn can_resolve(&self, value: &Value) -> bool {
        !matches!(value, Value::Table(_))
    }

    fn resolve(
        &self,
        _context: &ResolveContext<'_>,
        _placeholder: &Placeholder,
        value: &Value,
    ) -> Result<Resolution> {
        Ok(Resolution::text(value.to_string()))
    }
}
