/*
 * expander.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template expansion engine.
//!
//! This module turns template instances into ground triples. Expansion is
//! recursive: every nested instance in a template body is expanded in place,
//! so the output order follows the body order of each definition, then the
//! repetition order produced by list expansion.

use crate::blank::BlankScope;
use crate::environment::ScopeId;
use crate::error::{ErrorKind, ExpandResult};
use crate::expand_context::ExpansionContext;
use crate::list_expansion::expand_rows;
use crate::options::ExpandOptions;
use crate::registry::TemplateRegistry;
use crate::template::{
    Argument, Instance, InstancePattern, Parameter, Pattern, Signature, Template,
};
use crate::term::{OTTR_TRIPLE, RDF_FIRST, RDF_NIL, RDF_REST, Term, Triple};

/// Expands instances against a registry.
///
/// The expander itself holds nothing but the registry reference; all
/// per-request state lives in the [`ExpansionContext`].
#[derive(Debug, Clone, Copy)]
pub struct Expander<'r> {
    registry: &'r TemplateRegistry,
}

impl<'r> Expander<'r> {
    pub fn new(registry: &'r TemplateRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r TemplateRegistry {
        self.registry
    }

    /// Expand one root instance with a fresh context.
    pub fn expand(&self, root: &Instance, options: &ExpandOptions) -> ExpandResult<Vec<Triple>> {
        let mut ctx = ExpansionContext::from_options(options);
        self.expand_root(root, &mut ctx)
    }

    /// Expand one root instance inside an existing context.
    ///
    /// The root template name may use a registered prefix. Root arguments
    /// must be ground; blank nodes among them are kept as given.
    pub fn expand_root(
        &self,
        root: &Instance,
        ctx: &mut ExpansionContext,
    ) -> ExpandResult<Vec<Triple>> {
        let name = self
            .registry
            .resolve_root_name(&root.template)
            .map_err(|e| ctx.traced(e))?;
        if let Some(variable) = root.arguments.iter().find_map(Term::first_variable) {
            return Err(ctx.fail(ErrorKind::UnboundVariable {
                name: variable.to_string(),
            }));
        }

        let mut out = Vec::new();
        self.expand_instance(&name, root.arguments.clone(), ctx, &mut out)?;
        Ok(out)
    }

    /// Expand `name` applied to resolved `arguments`, appending to `out`.
    pub fn expand_instance(
        &self,
        name: &str,
        arguments: Vec<Term>,
        ctx: &mut ExpansionContext,
        out: &mut Vec<Triple>,
    ) -> ExpandResult<()> {
        if name == OTTR_TRIPLE {
            return emit_triple_instance(arguments, ctx, out);
        }

        ctx.enter(name, &arguments)?;
        let result = self.instantiate(name, arguments, ctx, out);
        ctx.leave();
        result
    }

    fn instantiate(
        &self,
        name: &str,
        arguments: Vec<Term>,
        ctx: &mut ExpansionContext,
        out: &mut Vec<Triple>,
    ) -> ExpandResult<()> {
        let template = self.registry.lookup(name).map_err(|e| ctx.traced(e))?;
        let parameters = &template.signature.parameters;

        let Some(values) = bind_arguments(&template.signature, arguments).map_err(|k| ctx.fail(k))?
        else {
            tracing::debug!(template = %name, "Skipping instance with ottr:none argument");
            return Ok(());
        };

        for (parameter, value) in parameters.iter().zip(&values) {
            check_argument(name, parameter, value, ctx.check_types).map_err(|k| ctx.fail(k))?;
        }

        let rows = expand_rows(name, parameters, values).map_err(|k| ctx.fail(k))?;
        tracing::debug!(
            template = %name,
            repetitions = rows.len(),
            depth = ctx.depth(),
            "Expanding template instance"
        );

        let mark = ctx.scopes.mark();
        let result = self.expand_repetitions(template, rows, ctx, out);
        ctx.scopes.release(mark);
        result
    }

    fn expand_repetitions(
        &self,
        template: &Template,
        rows: Vec<Vec<Term>>,
        ctx: &mut ExpansionContext,
        out: &mut Vec<Triple>,
    ) -> ExpandResult<()> {
        let parameters = &template.signature.parameters;

        let defaults = ctx.scopes.push_scope(None);
        for parameter in parameters {
            if let Some(default) = &parameter.default {
                ctx.scopes
                    .bind(defaults, &parameter.name, default.clone())
                    .map_err(|k| ctx.fail(k))?;
            }
        }

        for row in rows {
            // list elements and zipMax padding can be none: defaults apply here too
            let row: Vec<Term> = parameters
                .iter()
                .zip(row)
                .map(|(parameter, value)| match (&parameter.default, value) {
                    (Some(default), Term::None) => default.clone(),
                    (_, value) => value,
                })
                .collect();

            if let Some(parameter) = parameters
                .iter()
                .zip(&row)
                .find_map(|(p, v)| (v.is_none() && !p.optional).then_some(p))
            {
                tracing::debug!(
                    template = %template.name(),
                    parameter = %parameter.name,
                    "Skipping repetition with ottr:none argument"
                );
                continue;
            }

            let row_mark = ctx.scopes.mark();
            let scope = ctx.scopes.push_scope(Some(defaults));
            for (parameter, value) in parameters.iter().zip(row) {
                if parameter.default.as_ref() != Some(&value) {
                    ctx.scopes
                        .bind(scope, &parameter.name, value)
                        .map_err(|k| ctx.fail(k))?;
                }
            }

            let mut blanks = BlankScope::new();
            for pattern in &template.body {
                match pattern {
                    Pattern::Triple(triple) => {
                        let subject = ctx.resolve_body_term(scope, &triple.subject, &mut blanks)?;
                        let predicate =
                            ctx.resolve_body_term(scope, &triple.predicate, &mut blanks)?;
                        let object = ctx.resolve_body_term(scope, &triple.object, &mut blanks)?;
                        emit_triple(subject, predicate, object, ctx, out)?;
                    }
                    Pattern::Instance(instance) => {
                        self.expand_nested(instance, scope, &mut blanks, ctx, out)?;
                    }
                }
            }
            ctx.scopes.release(row_mark);
        }
        Ok(())
    }

    /// Resolve and expand a nested instance. Inline instances among its
    /// arguments are expanded first; each contributes its first argument.
    /// Returns this instance's own first argument.
    fn expand_nested(
        &self,
        instance: &InstancePattern,
        scope: ScopeId,
        blanks: &mut BlankScope,
        ctx: &mut ExpansionContext,
        out: &mut Vec<Triple>,
    ) -> ExpandResult<Term> {
        let mut arguments = Vec::with_capacity(instance.arguments.len());
        for argument in &instance.arguments {
            let value = match argument {
                Argument::Term(term) => ctx.resolve_body_term(scope, term, blanks)?,
                Argument::Instance(inner) => self.expand_nested(inner, scope, blanks, ctx, out)?,
            };
            arguments.push(value);
        }
        let anchor = arguments.first().cloned().unwrap_or(Term::None);
        self.expand_instance(&instance.template, arguments, ctx, out)?;
        Ok(anchor)
    }
}

/// Line arguments up with parameters.
///
/// Missing and `ottr:none` arguments take the parameter default, or stay
/// none for optional parameters. `Ok(None)` means the instance is skipped
/// because a mandatory argument is none.
fn bind_arguments(
    signature: &Signature,
    arguments: Vec<Term>,
) -> Result<Option<Vec<Term>>, ErrorKind> {
    signature.check_arity(arguments.len())?;

    let count = signature.parameters.len();
    let mut arguments = arguments.into_iter();
    let mut values = Vec::with_capacity(count);
    for (index, parameter) in signature.parameters.iter().enumerate() {
        let argument = if parameter.variadic && index + 1 == count {
            Some(Term::List(arguments.by_ref().collect()))
        } else {
            arguments.next()
        };
        let value = match argument {
            Some(term) if !term.is_none() => term,
            _ => match &parameter.default {
                Some(default) => default.clone(),
                None if parameter.optional => Term::None,
                None => return Ok(None),
            },
        };
        values.push(value);
    }
    Ok(Some(values))
}

/// Check one bound value against its parameter's declaration.
fn check_argument(
    template: &str,
    parameter: &Parameter,
    value: &Term,
    check_types: bool,
) -> Result<(), ErrorKind> {
    if parameter.non_blank && value.contains_blank_node() {
        return Err(ErrorKind::BlankNodeNotAllowed {
            template: template.to_string(),
            parameter: parameter.name.clone(),
            value: value.clone(),
        });
    }

    let Some(expected) = parameter.param_type.as_ref().filter(|_| check_types) else {
        return Ok(());
    };
    // A list handed to a repeating parameter is checked item by item
    let elementwise = (parameter.modifier.is_some() || parameter.variadic) && !expected.is_list();
    let offending = match value {
        Term::List(items) if elementwise => items.iter().find(|item| !expected.accepts(item)),
        _ => (!expected.accepts(value)).then_some(value),
    };
    match offending {
        Some(actual) => Err(ErrorKind::TypeMismatch {
            template: template.to_string(),
            parameter: parameter.name.clone(),
            expected: expected.to_string(),
            actual: actual.clone(),
        }),
        None => Ok(()),
    }
}

/// The built-in `ottr:Triple` template.
fn emit_triple_instance(
    arguments: Vec<Term>,
    ctx: &mut ExpansionContext,
    out: &mut Vec<Triple>,
) -> ExpandResult<()> {
    match <[Term; 3]>::try_from(arguments) {
        Ok([subject, predicate, object]) => emit_triple(subject, predicate, object, ctx, out),
        Err(arguments) => Err(ctx.fail(ErrorKind::ArityMismatch {
            template: OTTR_TRIPLE.to_string(),
            parameters: 3,
            arguments: arguments.len(),
            reason: "ottr:Triple takes subject, predicate and object".to_string(),
        })),
    }
}

fn invalid(position: &str, term: Term, reason: &str) -> ErrorKind {
    ErrorKind::InvalidTriple {
        position: position.to_string(),
        term,
        reason: reason.to_string(),
    }
}

/// Validate resolved positions and append the triple. A none in any
/// position drops the triple; a list object becomes an RDF collection.
fn emit_triple(
    subject: Term,
    predicate: Term,
    object: Term,
    ctx: &mut ExpansionContext,
    out: &mut Vec<Triple>,
) -> ExpandResult<()> {
    if subject.is_none() || predicate.is_none() || object.is_none() {
        tracing::trace!("Dropping triple with ottr:none");
        return Ok(());
    }

    let reason = match &subject {
        Term::Iri(_) | Term::BlankNode(_) => None,
        Term::Literal(_) => Some("a literal cannot be a subject"),
        Term::List(_) => Some("a list cannot be a subject"),
        Term::Variable(_) | Term::None => Some("not a ground RDF term"),
    };
    if let Some(reason) = reason {
        return Err(ctx.fail(invalid("subject", subject, reason)));
    }
    if !matches!(predicate, Term::Iri(_)) {
        return Err(ctx.fail(invalid("predicate", predicate, "a predicate must be an IRI")));
    }

    let object = match object {
        Term::List(items) => emit_list(&items, ctx, out)?,
        Term::Variable(name) => {
            return Err(ctx.fail(invalid(
                "object",
                Term::Variable(name),
                "not a ground RDF term",
            )));
        }
        other => other,
    };
    push(Triple::new(subject, predicate, object), out);
    Ok(())
}

/// Materialise a list as an `rdf:first`/`rdf:rest` chain and return its head.
fn emit_list(items: &[Term], ctx: &mut ExpansionContext, out: &mut Vec<Triple>) -> ExpandResult<Term> {
    if items.is_empty() {
        return Ok(Term::iri(RDF_NIL));
    }

    let nodes: Vec<Term> = items.iter().map(|_| ctx.allocator.fresh()).collect();
    for (index, item) in items.iter().enumerate() {
        let value = match item {
            Term::List(inner) => emit_list(inner, ctx, out)?,
            Term::None => {
                return Err(ctx.fail(invalid(
                    "list element",
                    Term::None,
                    "ottr:none cannot be a list element",
                )));
            }
            Term::Variable(_) => {
                return Err(ctx.fail(invalid("list element", item.clone(), "not a ground RDF term")));
            }
            other => other.clone(),
        };
        let rest = nodes
            .get(index + 1)
            .cloned()
            .unwrap_or_else(|| Term::iri(RDF_NIL));
        push(Triple::new(nodes[index].clone(), Term::iri(RDF_FIRST), value), out);
        push(Triple::new(nodes[index].clone(), Term::iri(RDF_REST), rest), out);
    }
    Ok(nodes[0].clone())
}

fn push(triple: Triple, out: &mut Vec<Triple>) {
    tracing::trace!(%triple, "Emitting triple");
    out.push(triple);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ParamType;
    use pretty_assertions::assert_eq;

    fn ex(s: &str) -> Term {
        Term::iri(format!("http://example.com/{s}"))
    }

    fn options() -> ExpandOptions {
        ExpandOptions::new().with_blank_node_namespace("b")
    }

    fn registry(templates: Vec<Template>) -> TemplateRegistry {
        TemplateRegistry::with_templates(templates).unwrap()
    }

    fn person() -> Template {
        Template::new(
            Signature::new("Person")
                .with_parameter(Parameter::new("p").with_type(ParamType::Iri))
                .with_parameter(Parameter::new("name").with_type(ParamType::Literal(None))),
        )
        .triple(Term::var("p"), ex("name"), Term::var("name"))
    }

    #[test]
    fn test_simple_expansion() {
        let registry = registry(vec![person()]);
        let triples = Expander::new(&registry)
            .expand(&Instance::new("Person", [ex("alice"), Term::string("Alice")]), &options())
            .unwrap();
        assert_eq!(
            triples,
            vec![Triple::new(ex("alice"), ex("name"), Term::string("Alice"))]
        );
    }

    #[test]
    fn test_type_mismatch() {
        let registry = registry(vec![person()]);
        let err = Expander::new(&registry)
            .expand(&Instance::new("Person", [Term::string("x"), Term::string("y")]), &options())
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::TypeMismatch {
                template: "Person".to_string(),
                parameter: "p".to_string(),
                expected: "IRI".to_string(),
                actual: Term::string("x"),
            }
        );
        assert_eq!(err.trace.frames().len(), 1);
    }

    #[test]
    fn test_type_check_can_be_disabled() {
        let registry = registry(vec![person()]);
        let triples = Expander::new(&registry)
            .expand(
                &Instance::new("Person", [ex("a"), ex("b")]),
                &options().with_check_types(false),
            )
            .unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn test_bind_arguments_defaults_and_none() {
        let signature = Signature::new("S")
            .with_parameter(Parameter::new("a"))
            .with_parameter(Parameter::new("b").with_default(ex("dflt")))
            .with_parameter(Parameter::new("c").optional());

        assert_eq!(
            bind_arguments(&signature, vec![ex("x")]).unwrap(),
            Some(vec![ex("x"), ex("dflt"), Term::None])
        );
        assert_eq!(
            bind_arguments(&signature, vec![ex("x"), Term::None, ex("z")]).unwrap(),
            Some(vec![ex("x"), ex("dflt"), ex("z")])
        );
        assert_eq!(
            bind_arguments(&signature, vec![Term::None]).unwrap(),
            None
        );
    }

    #[test]
    fn test_bind_arguments_variadic() {
        let signature = Signature::new("V")
            .with_parameter(Parameter::new("head"))
            .with_parameter(Parameter::new("rest").variadic());
        assert_eq!(
            bind_arguments(&signature, vec![ex("a"), ex("b"), ex("c")]).unwrap(),
            Some(vec![ex("a"), Term::list([ex("b"), ex("c")])])
        );
        assert_eq!(
            bind_arguments(&signature, vec![ex("a")]).unwrap(),
            Some(vec![ex("a"), Term::list([])])
        );
    }

    #[test]
    fn test_non_blank_rejects_nested_blank() {
        let parameter = Parameter::new("x").non_blank();
        let value = Term::list([ex("a"), Term::blank("b")]);
        assert!(matches!(
            check_argument("T", &parameter, &value, false),
            Err(ErrorKind::BlankNodeNotAllowed { .. })
        ));
        assert!(check_argument("T", &parameter, &ex("a"), false).is_ok());
    }

    #[test]
    fn test_elementwise_type_check_for_modifier() {
        let parameter = Parameter::new("x").with_type(ParamType::Iri).cross();
        assert!(check_argument("T", &parameter, &Term::list([ex("a"), ex("b")]), true).is_ok());
        assert_eq!(
            check_argument("T", &parameter, &Term::list([ex("a"), Term::string("s")]), true),
            Err(ErrorKind::TypeMismatch {
                template: "T".to_string(),
                parameter: "x".to_string(),
                expected: "IRI".to_string(),
                actual: Term::string("s"),
            })
        );
    }

    #[test]
    fn test_builtin_triple_arity() {
        let registry = TemplateRegistry::new();
        let err = Expander::new(&registry)
            .expand(&Instance::new(OTTR_TRIPLE, [ex("a"), ex("b")]), &options())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ArityMismatch { parameters: 3, .. }));
    }

    #[test]
    fn test_list_object_materialised() {
        let registry = TemplateRegistry::new();
        let triples = Expander::new(&registry)
            .expand(
                &Instance::new(OTTR_TRIPLE, [ex("s"), ex("p"), Term::list([ex("a"), ex("b")])]),
                &options(),
            )
            .unwrap();
        let first = || Term::iri(RDF_FIRST);
        let rest = || Term::iri(RDF_REST);
        assert_eq!(
            triples,
            vec![
                Triple::new(Term::blank("b_0"), first(), ex("a")),
                Triple::new(Term::blank("b_0"), rest(), Term::blank("b_1")),
                Triple::new(Term::blank("b_1"), first(), ex("b")),
                Triple::new(Term::blank("b_1"), rest(), Term::iri(RDF_NIL)),
                Triple::new(ex("s"), ex("p"), Term::blank("b_0")),
            ]
        );
    }

    #[test]
    fn test_invalid_positions() {
        let registry = TemplateRegistry::new();
        let expander = Expander::new(&registry);
        let literal_subject = Instance::new(OTTR_TRIPLE, [Term::string("s"), ex("p"), ex("o")]);
        let blank_predicate = Instance::new(OTTR_TRIPLE, [ex("s"), Term::blank("p"), ex("o")]);
        for instance in [literal_subject, blank_predicate] {
            let err = expander.expand(&instance, &options()).unwrap_err();
            assert_eq!(err.code(), "OX-5001");
        }
    }
}
