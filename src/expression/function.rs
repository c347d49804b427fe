//! Custom functions callable from expression text.

use crate::error::{Error, Result};
use crate::value::{Value, ValueKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type FunctionBody = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A named function with a fixed, typed parameter list.
#[derive(Clone)]
pub struct CustomFunction {
    name: String,
    params: Vec<ValueKind>,
    body: FunctionBody,
}

impl CustomFunction {
    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter kinds.
    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    /// Bind arguments to the declared kinds and invoke the body.
    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        let mismatch = |args: &[Value]| Error::FunctionMismatch {
            function: self.name.clone(),
            expected: join_kinds(self.params.iter().copied()),
            actual: join_kinds(args.iter().map(Value::kind)),
        };

        if args.len() != self.params.len() {
            return Err(mismatch(&args));
        }

        let mut bound = Vec::with_capacity(args.len());
        for (arg, kind) in args.iter().zip(&self.params) {
            match arg.clone().coerce(*kind) {
                Ok(value) => bound.push(value),
                Err(_) => return Err(mismatch(&args)),
            }
        }

        (self.body)(&bound)
    }
}

impl fmt::Debug for CustomFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn join_kinds(kinds: impl Iterator<Item = ValueKind>) -> String {
    kinds.map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
}

/// Registry of custom functions, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, CustomFunction>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function. A later registration under the same name
    /// replaces the earlier one.
    pub fn register<F>(&mut self, name: impl Into<String>, params: Vec<ValueKind>, body: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            CustomFunction {
                name,
                params,
                body: Arc::new(body),
            },
        );
    }

    /// Check if a function is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Look up a function.
    pub fn get(&self, name: &str) -> Option<&CustomFunction> {
        self.functions.get(name)
    }

    /// Number of registered functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
