//! Scoped variable environment for the formula evaluator.

use crate::value::{Function, Value};
use formula_types::{AssignError, ValueType};
use std::collections::{BTreeMap, HashMap};

/// A chain of scopes.
///
/// Unqualified names are looked up from the innermost scope outward.
/// Assignment always writes into the innermost scope, which fails if that
/// scope is read-only. Qualified lookups (`scope:name`) do not walk the
/// chain for namespace values; they only look inside the namespace.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: BTreeMap<String, Value>,
    /// Methods reachable as `value:name` for values of a given type.
    methods: HashMap<ValueType, BTreeMap<String, Function>>,
    read_only: bool,
    parent: Option<Box<Environment>>,
}

impl Environment {
    /// Create a writable root environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root environment that rejects assignment.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    /// Create a writable scope nested inside `parent`.
    pub fn child(parent: Environment) -> Self {
        Self::with_parent(Some(parent), false)
    }

    pub fn with_parent(parent: Option<Environment>, read_only: bool) -> Self {
        Self {
            read_only,
            parent: parent.map(Box::new),
            ..Self::default()
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.parent.as_deref()
    }

    /// Drop this scope and return its parent.
    pub fn into_parent(self) -> Option<Environment> {
        self.parent.map(|p| *p)
    }

    /// Look up `name`.
    ///
    /// With `scope = None` the scope chain is searched innermost first. With a
    /// namespace scope only that namespace is searched. Any other scope value
    /// selects the methods registered for its type.
    pub fn lookup(&self, name: &str, scope: Option<&Value>) -> Option<Value> {
        match scope {
            None => self.lookup_unqualified(name),
            Some(Value::Namespace(ns)) => ns.get(name).cloned(),
            Some(receiver) => self
                .lookup_method(&receiver.value_type(), name)
                .map(Value::Function),
        }
    }

    fn lookup_unqualified(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(v) = env.bindings.get(name) {
                return Some(v.clone());
            }
            scope = env.parent.as_deref();
        }
        None
    }

    fn lookup_method(&self, ty: &ValueType, name: &str) -> Option<Function> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(f) = env.methods.get(ty).and_then(|table| table.get(name)) {
                return Some(f.clone());
            }
            scope = env.parent.as_deref();
        }
        None
    }

    /// Assign `value` to a possibly qualified target in the innermost scope.
    ///
    /// `["ns", "x"]` writes `x` inside namespace `ns`, creating it if needed.
    /// A namespace inherited from an outer scope is copied into this scope
    /// before the write, so outer scopes never change.
    pub fn assign(&mut self, path: &[String], value: Value) -> Result<(), AssignError> {
        if self.read_only {
            tracing::debug!(path = %path.join(":"), "rejected assignment to read-only scope");
            return Err(AssignError::ReadOnly);
        }
        let (first, rest) = path.split_first().ok_or(AssignError::EmptyTarget)?;
        tracing::trace!(path = %path.join(":"), ty = %value.value_type(), "assign");

        if rest.is_empty() {
            self.bindings.insert(first.clone(), value);
            return Ok(());
        }

        let parent = self.parent.as_deref();
        let slot = self.bindings.entry(first.clone()).or_insert_with(|| {
            match parent.and_then(|p| p.lookup(first, None)) {
                Some(ns @ Value::Namespace(_)) => ns,
                _ => Value::Namespace(Default::default()),
            }
        });
        match slot {
            Value::Namespace(ns) => ns.insert_path(rest, value),
            other => Err(AssignError::NotANamespace {
                segment: first.clone(),
                actual: other.value_type(),
            }),
        }
    }

    /// Seed a binding, ignoring the read-only flag.
    ///
    /// Pass a [`Value::Namespace`] to make its members reachable as `name:member`.
    pub fn add_ns(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::trace!(%name, ty = %value.value_type(), "seed binding");
        self.bindings.insert(name, value);
    }

    /// Register `function` as a method on values of type `ty`.
    pub fn define_method(&mut self, ty: ValueType, function: Function) {
        self.methods
            .entry(ty)
            .or_default()
            .insert(function.name().to_string(), function);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Namespace;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut root = Environment::new();
        root.add_ns("x", Value::Number(1.0));
        let mut child = Environment::child(root);
        child.add_ns("y", Value::Number(2.0));
        assert_eq!(child.lookup("x", None), Some(Value::Number(1.0)));
        assert_eq!(child.lookup("y", None), Some(Value::Number(2.0)));
        assert_eq!(child.lookup("z", None), None);
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let mut root = Environment::new();
        root.add_ns("x", Value::Number(1.0));
        let mut child = Environment::child(root);
        child.assign(&path(&["x"]), Value::Number(9.0)).unwrap();
        assert_eq!(child.lookup("x", None), Some(Value::Number(9.0)));
        let root = child.into_parent().unwrap();
        assert_eq!(root.lookup("x", None), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_read_only_rejects_assign() {
        let mut env = Environment::read_only();
        assert_eq!(
            env.assign(&path(&["x"]), Value::Number(1.0)),
            Err(AssignError::ReadOnly)
        );
        env.add_ns("x", Value::Number(1.0));
        assert_eq!(env.lookup("x", None), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_empty_target() {
        let mut env = Environment::new();
        assert_eq!(env.assign(&[], Value::Bool(true)), Err(AssignError::EmptyTarget));
    }

    #[test]
    fn test_qualified_lookup_stays_in_namespace() {
        let ns: Namespace = [("price".to_string(), Value::Number(3.0))]
            .into_iter()
            .collect();
        let mut env = Environment::new();
        env.add_ns("total", Value::Number(10.0));
        let scope = Value::Namespace(ns);
        assert_eq!(env.lookup("price", Some(&scope)), Some(Value::Number(3.0)));
        assert_eq!(env.lookup("total", Some(&scope)), None);
    }

    #[test]
    fn test_qualified_assign_creates_namespace() {
        let mut env = Environment::new();
        env.assign(&path(&["order", "qty"]), Value::Number(4.0))
            .unwrap();
        let order = env.lookup("order", None).unwrap();
        assert_eq!(env.lookup("qty", Some(&order)), Some(Value::Number(4.0)));
    }

    #[test]
    fn test_qualified_assign_copies_inherited_namespace() {
        let ns: Namespace = [("a".to_string(), Value::Number(1.0))].into_iter().collect();
        let mut root = Environment::read_only();
        root.add_ns("fields", Value::Namespace(ns));
        let mut child = Environment::child(root);
        child
            .assign(&path(&["fields", "b"]), Value::Number(2.0))
            .unwrap();

        let fields = child.lookup("fields", None).unwrap();
        assert_eq!(child.lookup("a", Some(&fields)), Some(Value::Number(1.0)));
        assert_eq!(child.lookup("b", Some(&fields)), Some(Value::Number(2.0)));

        let root = child.into_parent().unwrap();
        let outer = root.lookup("fields", None).unwrap();
        assert_eq!(root.lookup("b", Some(&outer)), None);
    }

    #[test]
    fn test_qualified_assign_through_non_namespace() {
        let mut env = Environment::new();
        env.add_ns("x", Value::Number(1.0));
        assert_eq!(
            env.assign(&path(&["x", "y"]), Value::Number(2.0)),
            Err(AssignError::NotANamespace {
                segment: "x".into(),
                actual: ValueType::Number,
            })
        );
    }

    #[test]
    fn test_qualified_assign_shadows_inherited_non_namespace() {
        let mut root = Environment::new();
        root.add_ns("x", Value::Number(1.0));
        let mut child = Environment::with_parent(Some(root), false);
        assert_eq!(child.assign(&path(&["x", "y"]), Value::Number(2.0)), Ok(()));
        assert_eq!(
            child.lookup("y", Some(&child.lookup("x", None).unwrap())),
            Some(Value::Number(2.0))
        );
    }

    #[test]
    fn test_method_lookup_by_receiver_type() {
        let mut root = Environment::new();
        root.define_method(
            ValueType::Text,
            Function::method("length", |_, args| {
                let len = args
                    .first()
                    .and_then(Value::as_text)
                    .map_or(0, |s| s.chars().count());
                Ok(Value::Number(len as f64))
            }),
        );
        let child = Environment::child(root);
        let found = child.lookup("length", Some(&Value::text("abc")));
        assert!(matches!(found, Some(Value::Function(f)) if f.name() == "length"));
        assert_eq!(child.lookup("length", Some(&Value::Number(1.0))), None);
    }
}
