/*
 * term.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! RDF term model.
//!
//! [`Term`] is a closed sum type over the kinds of values that can appear in
//! a template body or be passed as a template argument. Only
//! [`Term::Variable`] is unresolved; every other variant is ground.
//!
//! The `Display` implementations use N-Triples syntax, so that triples and
//! argument snapshots in error messages read like RDF.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace of the OTTR vocabulary.
pub const OTTR_NS: &str = "http://ns.ottr.xyz/0.4/";
/// The base template that every triple pattern is an instance of.
pub const OTTR_TRIPLE: &str = "http://ns.ottr.xyz/0.4/Triple";
/// IRI of the `ottr:none` value.
pub const OTTR_NONE: &str = "http://ns.ottr.xyz/0.4/none";

pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

fn default_datatype() -> String {
    XSD_STRING.to_string()
}

/// An RDF literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Lexical form.
    pub value: String,
    /// Datatype IRI. `rdf:langString` whenever `language` is set.
    #[serde(default = "default_datatype")]
    pub datatype: String,
    /// Optional language tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: XSD_STRING.to_string(),
            language: None,
        }
    }

    /// A literal with an explicit datatype IRI.
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// A language-tagged string.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into()),
        }
    }
}

/// The kind of a [`Term`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Iri,
    Literal,
    BlankNode,
    Variable,
    List,
    None,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TermKind::Iri => "IRI",
            TermKind::Literal => "literal",
            TermKind::BlankNode => "blank node",
            TermKind::Variable => "variable",
            TermKind::List => "list",
            TermKind::None => "none",
        };
        f.write_str(name)
    }
}

/// A term in a template body, an argument, or an output triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Term {
    /// An absolute IRI.
    Iri(String),

    /// A literal value.
    Literal(Literal),

    /// A blank node. Inside a template body this is a placeholder that is
    /// replaced by a fresh node for every instantiation repetition.
    BlankNode(String),

    /// A reference to a template parameter.
    Variable(String),

    /// An ordered list of terms.
    List(Vec<Term>),

    /// `ottr:none`: the absence of a value.
    None,
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        Term::Variable(name.into())
    }

    /// A plain `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Term::Literal(Literal::string(value))
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal::typed(value, datatype))
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal::lang(value, language))
    }

    pub fn list(items: impl IntoIterator<Item = Term>) -> Self {
        Term::List(items.into_iter().collect())
    }

    pub fn kind(&self) -> TermKind {
        match self {
            Term::Iri(_) => TermKind::Iri,
            Term::Literal(_) => TermKind::Literal,
            Term::BlankNode(_) => TermKind::BlankNode,
            Term::Variable(_) => TermKind::Variable,
            Term::List(_) => TermKind::List,
            Term::None => TermKind::None,
        }
    }

    /// True if no variable occurs anywhere in this term.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::List(items) => items.iter().all(Term::is_ground),
            Term::Iri(_) | Term::Literal(_) | Term::BlankNode(_) | Term::None => true,
        }
    }

    /// The first variable occurring in this term, in depth-first order.
    pub fn first_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name.as_str()),
            Term::List(items) => items.iter().find_map(Term::first_variable),
            Term::Iri(_) | Term::Literal(_) | Term::BlankNode(_) | Term::None => None,
        }
    }

    /// True if a blank node occurs anywhere in this term.
    pub fn contains_blank_node(&self) -> bool {
        match self {
            Term::BlankNode(_) => true,
            Term::List(items) => items.iter().any(Term::contains_blank_node),
            Term::Iri(_) | Term::Literal(_) | Term::Variable(_) | Term::None => false,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Term::None)
    }

    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<Literal> for Term {
    fn from(literal: Literal) -> Self {
        Term::Literal(literal)
    }
}

fn escape_lexical(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_lexical(&self.value))?;
        match &self.language {
            Some(tag) => write!(f, "@{}", tag),
            None => write!(f, "^^<{}>", self.datatype),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::Literal(literal) => write!(f, "{}", literal),
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Variable(name) => write!(f, "?{}", name),
            Term::List(items) => {
                f.write_str("(")?;
                for item in items {
                    write!(f, " {}", item)?;
                }
                f.write_str(" )")
            }
            Term::None => f.write_str("ottr:none"),
        }
    }
}

/// A fully resolved RDF triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
