/*
 * blank.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Blank node allocation.
//!
//! A [`BlankNodeAllocator`] hands out labels of the form
//! `{namespace}_{counter}`. The counter never repeats within one allocator,
//! and allocators created without an explicit namespace get a random one,
//! so independent expansion requests cannot collide.
//!
//! A [`BlankScope`] maps the blank node placeholders written in one template
//! body to fresh nodes. One scope is used per instantiation repetition.

use crate::term::Term;
use std::collections::HashMap;
use uuid::Uuid;

/// Source of fresh blank node labels.
#[derive(Debug, Clone)]
pub struct BlankNodeAllocator {
    namespace: String,
    next: u64,
}

impl BlankNodeAllocator {
    /// Allocator with a random namespace.
    pub fn new() -> Self {
        Self::with_namespace(Uuid::new_v4().simple().to_string())
    }

    /// Allocator with a fixed namespace, for reproducible labels.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next: 0,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Number of labels handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next
    }

    pub fn fresh_label(&mut self) -> String {
        let label = format!("{}_{}", self.namespace, self.next);
        self.next += 1;
        label
    }

    pub fn fresh(&mut self) -> Term {
        Term::BlankNode(self.fresh_label())
    }
}

impl Default for BlankNodeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Placeholder-to-node mapping for one instantiation repetition.
#[derive(Debug, Default)]
pub struct BlankScope {
    labels: HashMap<String, String>,
}

impl BlankScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace blank node placeholders in a body term with this scope's
    /// nodes, allocating on first use. Variables are left untouched, so
    /// blank nodes that arrive as argument values are never renamed.
    pub fn localize(&mut self, term: &Term, allocator: &mut BlankNodeAllocator) -> Term {
        match term {
            Term::BlankNode(placeholder) => {
                let label = self
                    .labels
                    .entry(placeholder.clone())
                    .or_insert_with(|| allocator.fresh_label());
                Term::BlankNode(label.clone())
            }
            Term::List(items) => Term::List(
                items
                    .iter()
                    .map(|item| self.localize(item, allocator))
                    .collect(),
            ),
            Term::Iri(_) | Term::Literal(_) | Term::Variable(_) | Term::None => term.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
