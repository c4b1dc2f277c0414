/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! OTTR-style template expansion engine.
//!
//! This crate expands reusable RDF instance-data templates into flat, ordered
//! sequences of ground triples. It supports:
//!
//! - Nested template instances, expanded recursively in body order
//! - The built-in `ottr:Triple` template
//! - Parameter defaults, optional parameters and `ottr:none`
//! - Variadic parameters collected into a list
//! - List expansion modifiers: `cross`, `zip`, `zipMin`, `zipMax`
//! - Fresh blank nodes per instantiation repetition
//! - Cycle detection and a recursion depth ceiling
//! - RDF list objects materialised as `rdf:first`/`rdf:rest` chains
//!
//! # Architecture
//!
//! The engine works on **pre-parsed** definitions. Parsing a template syntax
//! and serializing the resulting triples are left to the caller; parsed
//! definitions derive serde so they can also be exchanged as data.
//!
//! A [`TemplateRegistry`] is filled once and then only read. Every expansion
//! request owns an [`ExpansionContext`] holding the blank node allocator, the
//! scope arena and the explicit call stack.
//!
//! # Example
//!
//! ```ignore
//! use ottr_expand::{Instance, Mapping, Parameter, Signature, Template, TemplateRegistry, Term};
//!
//! let mut registry = TemplateRegistry::new();
//! registry.define(
//!     Template::new(Signature::new("ex:Person").with_parameter(Parameter::new("p")))
//!         .triple(Term::var("p"), Term::iri("http://xmlns.com/foaf/0.1/knows"), Term::blank("x")),
//! )?;
//!
//! let triples = Mapping::new(&registry)
//!     .expand_all_or_nothing(&[Instance::new("ex:Person", [Term::iri("http://example.com/alice")])])?;
//! assert_eq!(triples.len(), 1);
//! ```

pub mod blank;
pub mod environment;
pub mod error;
pub mod expand_context;
pub mod expander;
pub mod list_expansion;
pub mod mapping;
pub mod options;
pub mod registry;
pub mod template;
pub mod term;

// Re-export main types at crate root
pub use blank::{BlankNodeAllocator, BlankScope};
pub use environment::{BindingEnvironment, ScopeId};
pub use error::{
    CallTrace, ErrorKind, ExpandResult, ExpansionError, MappingError, RootFailure,
    ValidationError, ValidationProblem,
};
pub use expand_context::{ExpansionContext, Frame};
pub use expander::Expander;
pub use mapping::{Mapping, MappingReport, TripleSink};
pub use options::{DEFAULT_MAX_DEPTH, ExpandOptions};
pub use registry::TemplateRegistry;
pub use template::{
    Argument, ExpansionModifier, Instance, InstancePattern, ParamType, Parameter, Pattern,
    Signature, Template, TriplePattern,
};
pub use term::{
    Literal, OTTR_NONE, OTTR_NS, OTTR_TRIPLE, RDF_FIRST, RDF_LANG_STRING, RDF_NIL, RDF_REST,
    Term, TermKind, Triple, XSD_STRING,
};
