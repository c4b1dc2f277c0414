/*
 * environment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Binding environments for template expansion.
//!
//! Scopes live in an arena and point at their parent by index, so nested
//! expansion never needs shared ownership of a scope. Scopes are created and
//! released in stack order: [`BindingEnvironment::mark`] before an
//! invocation, [`BindingEnvironment::release`] when it returns.

use crate::error::ErrorKind;
use crate::term::Term;
use std::collections::HashMap;

/// Handle to a scope inside a [`BindingEnvironment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Term>,
    parent: Option<ScopeId>,
}

/// Arena of variable scopes.
#[derive(Debug, Default)]
pub struct BindingEnvironment {
    scopes: Vec<Scope>,
}

impl BindingEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty scope, optionally falling back to `parent`.
    pub fn push_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            bindings: HashMap::new(),
            parent,
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Bind `name` in `scope`. Each name can be bound once per scope.
    pub fn bind(&mut self, scope: ScopeId, name: &str, term: Term) -> Result<(), ErrorKind> {
        let bindings = &mut self.scopes[scope.0].bindings;
        if bindings.contains_key(name) {
            return Err(ErrorKind::DuplicateBinding {
                name: name.to_string(),
            });
        }
        bindings.insert(name.to_string(), term);
        Ok(())
    }

    /// Look up `name`, chasing parent scopes.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Term> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id.0];
            if let Some(term) = scope.bindings.get(name) {
                return Some(term);
            }
            current = scope.parent;
        }
        None
    }

    /// Substitute every variable in `term` with its binding.
    pub fn resolve(&self, scope: ScopeId, term: &Term) -> Result<Term, ErrorKind> {
        match term {
            Term::Variable(name) => {
                self.lookup(scope, name)
                    .cloned()
                    .ok_or_else(|| ErrorKind::UnboundVariable { name: name.clone() })
            }
            Term::List(items) => items
                .iter()
                .map(|item| self.resolve(scope, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Term::List),
            Term::Iri(_) | Term::Literal(_) | Term::BlankNode(_) | Term::None => Ok(term.clone()),
        }
    }

    /// Current arena size, to be passed back to [`Self::release`].
    pub fn mark(&self) -> usize {
        self.scopes.len()
    }

    /// Drop every scope created since `mark`.
    pub fn release(&mut self, mark: usize) {
        self.scopes.truncate(mark);
    }

    /// Number of live scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
