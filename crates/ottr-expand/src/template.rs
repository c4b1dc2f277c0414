/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed template definitions.
//!
//! These types are the in-memory form handed over by whatever parses a
//! template library. They are plain data and derive serde so that a library
//! can also be exchanged as JSON or any other serde format.

use crate::error::ErrorKind;
use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a template parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Iri,
    /// A literal, optionally restricted to one datatype IRI.
    Literal(Option<String>),
    BlankNode,
    /// Any ground term.
    Any,
    List(Box<ParamType>),
    NonEmptyList(Box<ParamType>),
}

impl ParamType {
    pub fn list_of(inner: ParamType) -> Self {
        ParamType::List(Box::new(inner))
    }

    pub fn non_empty_list_of(inner: ParamType) -> Self {
        ParamType::NonEmptyList(Box::new(inner))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ParamType::List(_) | ParamType::NonEmptyList(_))
    }

    /// Check a ground term against this type. `ottr:none` is accepted by
    /// every type; whether a parameter may be none is decided by its
    /// `optional` flag, not by its type.
    pub fn accepts(&self, term: &Term) -> bool {
        if term.is_none() {
            return true;
        }
        match self {
            ParamType::Any => true,
            ParamType::Iri => matches!(term, Term::Iri(_)),
            ParamType::BlankNode => matches!(term, Term::BlankNode(_)),
            ParamType::Literal(datatype) => match (term, datatype) {
                (Term::Literal(_), None) => true,
                (Term::Literal(literal), Some(datatype)) => &literal.datatype == datatype,
                _ => false,
            },
            ParamType::List(inner) => match term {
                Term::List(items) => items.iter().all(|item| inner.accepts(item)),
                _ => false,
            },
            ParamType::NonEmptyList(inner) => match term {
                Term::List(items) => !items.is_empty() && items.iter().all(|i| inner.accepts(i)),
                _ => false,
            },
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Iri => f.write_str("IRI"),
            ParamType::Literal(None) => f.write_str("Literal"),
            ParamType::Literal(Some(datatype)) => write!(f, "<{}>", datatype),
            ParamType::BlankNode => f.write_str("BlankNode"),
            ParamType::Any => f.write_str("Any"),
            ParamType::List(inner) => write!(f, "List<{}>", inner),
            ParamType::NonEmptyList(inner) => write!(f, "NEList<{}>", inner),
        }
    }
}

/// List-expansion strategy of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpansionModifier {
    /// Cartesian product with the other cross-expanded lists.
    Cross,
    /// Positional pairing; all zipped lists must have the same length.
    Zip,
    /// Positional pairing truncated to the shortest list.
    ZipMin,
    /// Positional pairing padded with `ottr:none` to the longest list.
    ZipMax,
}

impl ExpansionModifier {
    pub fn is_zip(self) -> bool {
        matches!(
            self,
            ExpansionModifier::Zip | ExpansionModifier::ZipMin | ExpansionModifier::ZipMax
        )
    }
}

/// A template parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub param_type: Option<ParamType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Term>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<ExpansionModifier>,

    /// May be bound to `ottr:none` without skipping the instance.
    #[serde(default)]
    pub optional: bool,

    /// Rejects blank node arguments.
    #[serde(default)]
    pub non_blank: bool,

    /// Collects every argument from this position onward into one list.
    /// Only meaningful on the last parameter.
    #[serde(default)]
    pub variadic: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: None,
            default: None,
            modifier: None,
            optional: false,
            non_blank: false,
            variadic: false,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = Some(param_type);
        self
    }

    pub fn with_default(mut self, default: Term) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_modifier(mut self, modifier: ExpansionModifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    pub fn cross(self) -> Self {
        self.with_modifier(ExpansionModifier::Cross)
    }

    pub fn zip(self) -> Self {
        self.with_modifier(ExpansionModifier::Zip)
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn non_blank(mut self) -> Self {
        self.non_blank = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// A parameter that must be supplied positionally.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.optional && !self.variadic
    }
}

/// Template name plus ordered parameter list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn is_variadic(&self) -> bool {
        self.parameters.last().is_some_and(|p| p.variadic)
    }

    /// The first parameter name that occurs twice, if any.
    pub fn duplicate_parameter(&self) -> Option<&str> {
        self.parameters.iter().enumerate().find_map(|(i, p)| {
            self.parameters[..i]
                .iter()
                .any(|earlier| earlier.name == p.name)
                .then_some(p.name.as_str())
        })
    }

    /// Check that `count` positional arguments fit this signature.
    pub fn check_arity(&self, count: usize) -> Result<(), ErrorKind> {
        let parameters = self.parameters.len();
        let required = self
            .parameters
            .iter()
            .rposition(Parameter::is_required)
            .map_or(0, |i| i + 1);

        if count < required {
            let missing = self.parameters[count..]
                .iter()
                .find(|p| p.is_required())
                .map_or("", |p| p.name.as_str());
            return Err(ErrorKind::ArityMismatch {
                template: self.name.clone(),
                parameters,
                arguments: count,
                reason: format!("parameter ?{} has no default", missing),
            });
        }
        if count > parameters && !self.is_variadic() {
            return Err(ErrorKind::ArityMismatch {
                template: self.name.clone(),
                parameters,
                arguments: count,
                reason: "too many arguments".to_string(),
            });
        }
        Ok(())
    }
}

/// A triple pattern in a template body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// An argument of a nested instance: a term, or an inline instance whose
/// first argument is passed on after the inline instance is expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Term(Term),
    Instance(InstancePattern),
}

impl From<Term> for Argument {
    fn from(term: Term) -> Self {
        Argument::Term(term)
    }
}

impl From<InstancePattern> for Argument {
    fn from(instance: InstancePattern) -> Self {
        Argument::Instance(instance)
    }
}

/// A call to another template from inside a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstancePattern {
    pub template: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
}

impl InstancePattern {
    pub fn new(
        template: impl Into<String>,
        arguments: impl IntoIterator<Item = impl Into<Argument>>,
    ) -> Self {
        Self {
            template: template.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        }
    }
}

/// One element of a template body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pattern", rename_all = "snake_case")]
pub enum Pattern {
    Triple(TriplePattern),
    Instance(InstancePattern),
}

/// A named template: signature plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub signature: Signature,
    #[serde(default)]
    pub body: Vec<Pattern>,
}

impl Template {
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            body: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Append a triple pattern to the body.
    pub fn triple(mut self, subject: Term, predicate: Term, object: Term) -> Self {
        self.body.push(Pattern::Triple(TriplePattern {
            subject,
            predicate,
            object,
        }));
        self
    }

    /// Append a nested instance to the body.
    pub fn instance(mut self, instance: InstancePattern) -> Self {
        self.body.push(Pattern::Instance(instance));
        self
    }
}

/// A root instance: a template name applied to ground arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub template: String,
    #[serde(default)]
    pub arguments: Vec<Term>,
}

impl Instance {
    pub fn new(template: impl Into<String>, arguments: impl IntoIterator<Item = Term>) -> Self {
        Self {
            template: template.into(),
            arguments: arguments.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::XSD_STRING;

    fn sig() -> Signature {
        Signature::new("http://example.com/T")
            .with_parameter(Parameter::new("a"))
            .with_parameter(Parameter::new("b").optional())
            .with_parameter(Parameter::new("c").with_default(Term::string("c")))
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::Iri.accepts(&Term::iri("http://a")));
        assert!(!ParamType::Iri.accepts(&Term::string("a")));
        assert!(ParamType::Literal(None).accepts(&Term::string("a")));
        assert!(ParamType::Literal(Some(XSD_STRING.to_string())).accepts(&Term::string("a")));
        assert!(!ParamType::Literal(Some("http://x/int".to_string())).accepts(&Term::string("a")));
        assert!(ParamType::Iri.accepts(&Term::None));

        let list = ParamType::list_of(ParamType::Iri);
        assert!(list.accepts(&Term::list([])));
        assert!(list.accepts(&Term::list([Term::iri("http://a")])));
        assert!(!list.accepts(&Term::list([Term::blank("b")])));
        assert!(!ParamType::non_empty_list_of(ParamType::Iri).accepts(&Term::list([])));
    }

    #[test]
    fn test_check_arity() {
        let sig = sig();
        assert!(sig.check_arity(1).is_ok());
        assert!(sig.check_arity(3).is_ok());
        assert!(matches!(
            sig.check_arity(0),
            Err(ErrorKind::ArityMismatch { arguments: 0, .. })
        ));
        assert!(matches!(
            sig.check_arity(4),
            Err(ErrorKind::ArityMismatch { arguments: 4, .. })
        ));
    }

    #[test]
    fn test_arity_reason_names_missing_required_parameter() {
        let sig = Signature::new("T")
            .with_parameter(Parameter::new("a"))
            .with_parameter(Parameter::new("b").optional())
            .with_parameter(Parameter::new("c"));
        assert_eq!(
            sig.check_arity(1),
            Err(ErrorKind::ArityMismatch {
                template: "T".to_string(),
                parameters: 3,
                arguments: 1,
                reason: "parameter ?c has no default".to_string(),
            })
        );
    }

    #[test]
    fn test_check_arity_variadic() {
        let sig = Signature::new("V")
            .with_parameter(Parameter::new("head"))
            .with_parameter(Parameter::new("rest").variadic());
        assert!(sig.check_arity(1).is_ok());
        assert!(sig.check_arity(7).is_ok());
        assert!(sig.check_arity(0).is_err());
    }

    #[test]
    fn test_duplicate_parameter() {
        let sig = Signature::new("D")
            .with_parameter(Parameter::new("x"))
            .with_parameter(Parameter::new("y"))
            .with_parameter(Parameter::new("x"));
        assert_eq!(sig.duplicate_parameter(), Some("x"));
        assert_eq!(self::sig().duplicate_parameter(), None);
    }
}
