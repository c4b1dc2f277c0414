/*
 * expand_context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-request expansion state.
//!
//! [`ExpansionContext`] is threaded by `&mut` through every recursive
//! invocation of one expansion request. It owns:
//!
//! 1. **Blank node allocation**: one allocator for the whole request
//! 2. **Call stack**: explicit frames for cycle detection and the depth limit
//! 3. **Scopes**: the binding environment arena
//!
//! Concurrent requests against the same registry each need their own
//! context; nothing in it is shared.

use crate::blank::{BlankNodeAllocator, BlankScope};
use crate::environment::{BindingEnvironment, ScopeId};
use crate::error::{CallTrace, ErrorKind, ExpandResult, ExpansionError};
use crate::options::ExpandOptions;
use crate::term::Term;
use std::fmt;

/// One active template invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub template: String,
    pub arguments: Vec<Term>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.template)?;
        for (i, argument) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", argument)?;
        }
        f.write_str(")")
    }
}

/// State of one expansion request.
pub struct ExpansionContext {
    /// Blank node source for the whole request.
    pub allocator: BlankNodeAllocator,

    /// Variable scopes of the active invocations.
    pub scopes: BindingEnvironment,

    /// Check arguments against declared parameter types.
    pub check_types: bool,

    call_stack: Vec<Frame>,
    max_depth: usize,
}

impl ExpansionContext {
    /// Context with default options and a random blank node namespace.
    pub fn new() -> Self {
        Self::from_options(&ExpandOptions::default())
    }

    pub fn from_options(options: &ExpandOptions) -> Self {
        let allocator = match &options.blank_node_namespace {
            Some(namespace) => BlankNodeAllocator::with_namespace(namespace.clone()),
            None => BlankNodeAllocator::new(),
        };
        Self {
            allocator,
            scopes: BindingEnvironment::new(),
            check_types: options.check_types,
            call_stack: Vec::new(),
            max_depth: options.max_depth,
        }
    }

    /// Replace the allocator, e.g. to share a namespace between requests.
    pub fn with_allocator(mut self, allocator: BlankNodeAllocator) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of active invocations.
    pub fn depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn call_stack(&self) -> &[Frame] {
        &self.call_stack
    }

    /// Push an invocation, refusing exact repeats and excessive depth.
    pub fn enter(&mut self, template: &str, arguments: &[Term]) -> ExpandResult<()> {
        let repeated = self
            .call_stack
            .iter()
            .any(|frame| frame.template == template && frame.arguments == arguments);
        if repeated {
            return Err(self.fail(ErrorKind::CyclicExpansion {
                template: template.to_string(),
                arguments: arguments.to_vec(),
            }));
        }
        if self.call_stack.len() >= self.max_depth {
            return Err(self.fail(ErrorKind::DepthExceeded {
                limit: self.max_depth,
            }));
        }
        self.call_stack.push(Frame {
            template: template.to_string(),
            arguments: arguments.to_vec(),
        });
        Ok(())
    }

    /// Pop the innermost invocation.
    pub fn leave(&mut self) {
        self.call_stack.pop();
    }

    /// Snapshot of the call stack.
    pub fn trace(&self) -> CallTrace {
        CallTrace(self.call_stack.clone())
    }

    /// Wrap `kind` with the current call stack.
    pub fn fail(&self, kind: ErrorKind) -> ExpansionError {
        ExpansionError {
            kind,
            trace: self.trace(),
        }
    }

    /// Attach the current call stack to an error raised without one.
    pub fn traced(&self, error: ExpansionError) -> ExpansionError {
        error.with_trace(self.trace())
    }

    /// Resolve a body term: placeholders first, then variables.
    pub(crate) fn resolve_body_term(
        &mut self,
        scope: ScopeId,
        term: &Term,
        blanks: &mut BlankScope,
    ) -> ExpandResult<Term> {
        let localized = blanks.localize(term, &mut self.allocator);
        self.scopes
            .resolve(scope, &localized)
            .map_err(|kind| self.fail(kind))
    }

    /// Clear the call stack and scopes after a failed root, keeping the
    /// allocator so later roots still get distinct blank nodes.
    pub(crate) fn reset(&mut self) {
        self.call_stack.clear();
        self.scopes.release(0);
    }
}

impl Default for ExpansionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExpansionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpansionContext")
            .field("namespace", &self.allocator.namespace())
            .field("depth", &self.call_stack.len())
            .field("max_depth", &self.max_depth)
            .field("check_types", &self.check_types)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_MAX_DEPTH;

    #[test]
    fn test_context_defaults() {
        let ctx = ExpansionContext::new();
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.max_depth(), DEFAULT_MAX_DEPTH);
        assert!(ctx.check_types);
    }

    #[test]
    fn test_context_from_options() {
        let options = ExpandOptions::new()
            .with_max_depth(3)
            .with_blank_node_namespace("ns");
        let mut ctx = ExpansionContext::from_options(&options);
        assert_eq!(ctx.max_depth(), 3);
        assert_eq!(ctx.allocator.fresh(), Term::blank("ns_0"));
    }

    #[test]
    fn test_enter_detects_exact_repeat() {
        let mut ctx = ExpansionContext::new();
        let args = vec![Term::iri("http://a")];
        ctx.enter("T", &args).unwrap();
        ctx.enter("T", &[Term::iri("http://b")]).unwrap();

        let err = ctx.enter("T", &args).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::CyclicExpansion { .. }));
        assert_eq!(err.trace.frames().len(), 2);
        assert_eq!(ctx.depth(), 2);
    }

    #[test]
    fn test_enter_enforces_depth() {
        let mut ctx = ExpansionContext::new().with_max_depth(2);
        ctx.enter("A", &[]).unwrap();
        ctx.enter("B", &[]).unwrap();
        let err = ctx.enter("C", &[]).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DepthExceeded { limit: 2 });

        ctx.leave();
        assert!(ctx.enter("C", &[]).is_ok());
    }

    #[test]
    fn test_frame_display() {
        let frame = Frame {
            template: "T".to_string(),
            arguments: vec![Term::iri("http://a"), Term::string("b")],
        };
        assert_eq!(
            frame.to_string(),
            "T(<http://a>, \"b\"^^<http://www.w3.org/2001/XMLSchema#string>)"
        );
    }
}
