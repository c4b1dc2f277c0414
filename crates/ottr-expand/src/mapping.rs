/*
 * mapping.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Batch expansion of root instances.
//!
//! A [`Mapping`] expands an ordered list of root instances against one
//! registry. All roots of a run share one [`ExpansionContext`], and so one
//! blank node allocator, which keeps blank nodes from different roots
//! distinct. A root that fails contributes no triples at all.

use crate::error::{MappingError, RootFailure};
use crate::expand_context::ExpansionContext;
use crate::expander::Expander;
use crate::options::ExpandOptions;
use crate::registry::TemplateRegistry;
use crate::template::Instance;
use crate::term::Triple;

/// Destination for expanded triples.
pub trait TripleSink {
    fn insert(&mut self, triple: Triple);

    fn extend_triples(&mut self, triples: Vec<Triple>) {
        for triple in triples {
            self.insert(triple);
        }
    }
}

impl TripleSink for Vec<Triple> {
    fn insert(&mut self, triple: Triple) {
        self.push(triple);
    }

    fn extend_triples(&mut self, triples: Vec<Triple>) {
        self.extend(triples);
    }
}

/// Outcome of an independent mapping run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingReport {
    /// Triples of every successful root, in root order.
    pub triples: Vec<Triple>,
    /// Failed roots, in root order.
    pub failures: Vec<RootFailure>,
    /// Number of roots submitted.
    pub roots: usize,
}

impl MappingReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Expansion of a list of root instances.
#[derive(Debug, Clone)]
pub struct Mapping<'r> {
    registry: &'r TemplateRegistry,
    options: ExpandOptions,
}

impl<'r> Mapping<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self {
            registry,
            options: ExpandOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExpandOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExpandOptions {
        &self.options
    }

    /// Expand every root independently. Failed roots are reported and
    /// skipped; the others still produce their triples.
    pub fn expand(&self, roots: &[Instance]) -> MappingReport {
        let mut triples = Vec::new();
        let failures = self.expand_into(roots, &mut triples);
        MappingReport {
            triples,
            failures,
            roots: roots.len(),
        }
    }

    /// Expand every root independently into `sink`, returning the failures.
    pub fn expand_into<S: TripleSink>(&self, roots: &[Instance], sink: &mut S) -> Vec<RootFailure> {
        let expander = Expander::new(self.registry);
        let mut ctx = ExpansionContext::from_options(&self.options);
        let mut failures = Vec::new();
        let mut emitted = 0;

        for (index, root) in roots.iter().enumerate() {
            match expander.expand_root(root, &mut ctx) {
                Ok(triples) => {
                    emitted += triples.len();
                    sink.extend_triples(triples);
                }
                Err(error) => {
                    tracing::warn!(
                        root = index,
                        template = %root.template,
                        code = error.code(),
                        "Root instance failed to expand: {}",
                        error.kind()
                    );
                    ctx.reset();
                    failures.push(RootFailure {
                        index,
                        template: root.template.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            roots = roots.len(),
            triples = emitted,
            failures = failures.len(),
            "Mapping expanded"
        );
        failures
    }

    /// Expand every root, or none of them.
    ///
    /// Every root is still attempted so the error lists all failures.
    pub fn expand_all_or_nothing(&self, roots: &[Instance]) -> Result<Vec<Triple>, MappingError> {
        let report = self.expand(roots);
        if report.failures.is_empty() {
            Ok(report.triples)
        } else {
            Err(MappingError {
                roots: report.roots,
                failures: report.failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Parameter, Signature, Template};
    use crate::term::Term;

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry
            .define(
                Template::new(Signature::new("http://example.com/Node").with_parameter(Parameter::new("x")))
                    .triple(Term::var("x"), Term::iri("http://example.com/p"), Term::blank("b")),
            )
            .unwrap();
        registry.add_prefix("ex", "http://example.com/");
        registry
    }

    #[test]
    fn test_independent_roots() {
        let registry = registry();
        let roots = vec![
            Instance::new("ex:Node", [Term::iri("http://example.com/a")]),
            Instance::new("ex:Missing", []),
            Instance::new("http://example.com/Node", [Term::iri("http://example.com/b")]),
        ];
        let report = Mapping::new(&registry).expand(&roots);
        assert_eq!(report.roots, 3);
        assert_eq!(report.triples.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].error.code(), "OX-1001");

        // one allocator per run keeps blank nodes of different roots apart
        assert_ne!(report.triples[0].object, report.triples[1].object);
    }

    #[test]
    fn test_all_or_nothing() {
        let registry = registry();
        let good = Instance::new("ex:Node", [Term::iri("http://example.com/a")]);
        let bad = Instance::new("ex:Node", []);

        let mapping = Mapping::new(&registry);
        assert_eq!(mapping.expand_all_or_nothing(&[good.clone()]).unwrap().len(), 1);

        let err = mapping.expand_all_or_nothing(&[good, bad]).unwrap_err();
        assert_eq!(err.roots, 2);
        assert_eq!(err.failures.len(), 1);
        assert_eq!(err.failures[0].index, 1);
    }

    #[test]
    fn test_expand_into_vec_sink() {
        let registry = registry();
        let mut sink: Vec<Triple> = Vec::new();
        let failures = Mapping::new(&registry)
            .with_options(ExpandOptions::new().with_blank_node_namespace("m"))
            .expand_into(
                &[Instance::new("ex:Node", [Term::iri("http://example.com/a")])],
                &mut sink,
            );
        assert!(failures.is_empty());
        assert_eq!(
            sink,
            vec![Triple::new(
                Term::iri("http://example.com/a"),
                Term::iri("http://example.com/p"),
                Term::blank("m_0"),
            )]
        );
    }
}
