/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template registry.
//!
//! The registry maps template names to parsed [`Template`] definitions. It is
//! populated before expansion starts and is only read afterwards, so a
//! single registry can be shared by reference between concurrent
//! expansions.

use crate::error::{ErrorKind, ExpandResult, ValidationError, ValidationProblem};
use crate::template::{Argument, InstancePattern, Pattern, Template};
use crate::term::{OTTR_TRIPLE, Term};
use indexmap::IndexMap;

/// Named template definitions plus a prefix map for root-name lookup.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, Template>,
    prefixes: IndexMap<String, String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a sequence of templates.
    ///
    /// Fails on the first duplicate name or duplicate parameter.
    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> ExpandResult<Self> {
        let mut registry = Self::new();
        for template in templates {
            registry.define(template)?;
        }
        Ok(registry)
    }

    /// Add a template definition.
    pub fn define(&mut self, template: Template) -> ExpandResult<()> {
        let name = template.name().to_string();
        if self.templates.contains_key(&name) || name == OTTR_TRIPLE {
            return Err(ErrorKind::DuplicateTemplate { name }.into());
        }
        if let Some(duplicate) = template.signature.duplicate_parameter() {
            return Err(ErrorKind::DuplicateBinding {
                name: duplicate.to_string(),
            }
            .into());
        }
        tracing::trace!(template = %name, "Defining template");
        self.templates.insert(name, template);
        Ok(())
    }

    /// Look up a template by exact name.
    pub fn lookup(&self, name: &str) -> ExpandResult<&Template> {
        self.templates.get(name).ok_or_else(|| {
            ErrorKind::UnknownTemplate {
                name: name.to_string(),
            }
            .into()
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Templates in definition order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Register a prefix used when resolving root template names.
    pub fn add_prefix(
        &mut self,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
    ) -> &mut Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }

    /// Resolve the name of a root instance to a canonical template name.
    ///
    /// Exact names (and `ottr:Triple`) win; otherwise a `prefix:local` name
    /// is expanded through the prefix map.
    pub fn resolve_root_name(&self, name: &str) -> ExpandResult<String> {
        if name == OTTR_TRIPLE || self.templates.contains_key(name) {
            return Ok(name.to_string());
        }
        if let Some((prefix, local)) = name.split_once(':') {
            if let Some(namespace) = self.prefixes.get(prefix) {
                let expanded = format!("{}{}", namespace, local);
                if expanded == OTTR_TRIPLE || self.templates.contains_key(&expanded) {
                    return Ok(expanded);
                }
                return Err(ErrorKind::UnknownTemplate { name: expanded }.into());
            }
        }
        Err(ErrorKind::UnknownTemplate {
            name: name.to_string(),
        }
        .into())
    }

    /// Statically check every definition.
    ///
    /// Reports variables that are not parameters of the enclosing template,
    /// nested instances of undefined templates, and argument counts that no
    /// call could satisfy. All problems are collected, in definition order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut problems = Vec::new();
        for template in self.templates.values() {
            if let Some(duplicate) = template.signature.duplicate_parameter() {
                problems.push(ValidationProblem {
                    template: template.name().to_string(),
                    kind: ErrorKind::DuplicateBinding {
                        name: duplicate.to_string(),
                    },
                });
            }
            for pattern in &template.body {
                match pattern {
                    Pattern::Triple(triple) => {
                        for term in [&triple.subject, &triple.predicate, &triple.object] {
                            self.check_term(template, term, &mut problems);
                        }
                    }
                    Pattern::Instance(instance) => {
                        self.check_instance(template, instance, &mut problems);
                    }
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems })
        }
    }

    fn check_term(&self, template: &Template, term: &Term, problems: &mut Vec<ValidationProblem>) {
        match term {
            Term::Variable(name) => {
                if template.signature.parameter(name).is_none() {
                    problems.push(ValidationProblem {
                        template: template.name().to_string(),
                        kind: ErrorKind::UnboundVariable { name: name.clone() },
                    });
                }
            }
            Term::List(items) => {
                for item in items {
                    self.check_term(template, item, problems);
                }
            }
            Term::Iri(_) | Term::Literal(_) | Term::BlankNode(_) | Term::None => {}
        }
    }

    fn check_instance(
        &self,
        template: &Template,
        instance: &InstancePattern,
        problems: &mut Vec<ValidationProblem>,
    ) {
        for argument in &instance.arguments {
            match argument {
                Argument::Term(term) => self.check_term(template, term, problems),
                Argument::Instance(inner) => self.check_instance(template, inner, problems),
            }
        }

        let count = instance.arguments.len();
        if instance.template == OTTR_TRIPLE {
            if count != 3 {
                problems.push(ValidationProblem {
                    template: template.name().to_string(),
                    kind: ErrorKind::ArityMismatch {
                        template: OTTR_TRIPLE.to_string(),
                        parameters: 3,
                        arguments: count,
                        reason: "ottr:Triple takes subject, predicate and object".to_string(),
                    },
                });
            }
            return;
        }

        match self.templates.get(&instance.template) {
            Some(target) => {
                if let Err(kind) = target.signature.check_arity(count) {
                    problems.push(ValidationProblem {
                        template: template.name().to_string(),
                        kind,
                    });
                }
            }
            None => problems.push(ValidationProblem {
                template: template.name().to_string(),
                kind: ErrorKind::UnknownTemplate {
                    name: instance.template.clone(),
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Parameter, Signature};

    const EX: &str = "http://example.com/";

    fn person() -> Template {
        Template::new(
            Signature::new(format!("{EX}Person"))
                .with_parameter(Parameter::new("person"))
                .with_parameter(Parameter::new("name")),
        )
        .triple(
            Term::var("person"),
            Term::iri(format!("{EX}name")),
            Term::var("name"),
        )
    }

    #[test]
    fn test_define_and_lookup() {
        let mut registry = TemplateRegistry::new();
        registry.define(person()).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(&format!("{EX}Person")).unwrap().name(), format!("{EX}Person"));
    }

    #[test]
    fn test_duplicate_template() {
        let mut registry = TemplateRegistry::new();
        registry.define(person()).unwrap();
        let err = registry.define(person()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateTemplate { .. }));
    }

    #[test]
    fn test_cannot_redefine_ottr_triple() {
        let mut registry = TemplateRegistry::new();
        let err = registry
            .define(Template::new(Signature::new(OTTR_TRIPLE)))
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::DuplicateTemplate { .. }));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let template = Template::new(
            Signature::new("T")
                .with_parameter(Parameter::new("x"))
                .with_parameter(Parameter::new("x")),
        );
        let err = TemplateRegistry::new().define(template).unwrap_err();
        assert_eq!(
            err.kind(),
            &ErrorKind::DuplicateBinding {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_template() {
        let registry = TemplateRegistry::new();
        let err = registry.lookup("missing").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownTemplate { name } if name == "missing"));
    }

    #[test]
    fn test_resolve_root_name_with_prefix() {
        let mut registry = TemplateRegistry::with_templates([person()]).unwrap();
        registry.add_prefix("ex", EX);

        assert_eq!(
            registry.resolve_root_name("ex:Person").unwrap(),
            format!("{EX}Person")
        );
        assert_eq!(
            registry.resolve_root_name(&format!("{EX}Person")).unwrap(),
            format!("{EX}Person")
        );
        let err = registry.resolve_root_name("ex:Missing").unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::UnknownTemplate { name } if name == &format!("{EX}Missing"))
        );
        assert!(registry.resolve_root_name("nope:Person").is_err());
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let broken = Template::new(Signature::new("Broken").with_parameter(Parameter::new("x")))
            .triple(Term::var("x"), Term::iri(format!("{EX}p")), Term::var("y"))
            .instance(InstancePattern::new("Missing", [Term::var("x")]))
            .instance(InstancePattern::new(
                format!("{EX}Person"),
                [Term::var("x")],
            ))
            .instance(InstancePattern::new(OTTR_TRIPLE, [Term::var("x")]));
        let registry = TemplateRegistry::with_templates([person(), broken]).unwrap();

        let err = registry.validate().unwrap_err();
        let kinds: Vec<&str> = err.problems.iter().map(|p| p.kind.code()).collect();
        assert_eq!(kinds, vec!["OX-3001", "OX-1001", "OX-2001", "OX-2001"]);
        assert!(err.problems.iter().all(|p| p.template == "Broken"));
    }

    #[test]
    fn test_validate_ok() {
        let registry = TemplateRegistry::with_templates([person()]).unwrap();
        assert!(registry.validate().is_ok());
    }
}
