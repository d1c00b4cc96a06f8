use std::collections::HashMap;

use crate::{
    subst::{resolve_capture, substitute},
    symbol::{Interner, Symbol},
    term::Term,
};

/// The rewrite applied by one call to [`Evaluator::reduce`].
#[derive(PartialEq, Eq, Clone, Copy, derive_more::Display, Debug)]
pub enum Step {
    /// A bound symbol was renamed to avoid capture.
    #[display(fmt = "α")]
    Alpha,
    /// A redex was contracted.
    #[display(fmt = "β")]
    Beta,
    /// `λx. f x` collapsed to `f`.
    #[display(fmt = "η")]
    Eta,
    /// A defined name was replaced by a copy of its definition.
    #[display(fmt = "=")]
    Expand,
}

#[derive(Clone, Copy, Debug)]
pub struct Strategy {
    /// Reduce the subterms of an application before its head
    /// (applicative order). Off means normal order.
    pub innermost: bool,
    /// Never rewrite under an abstraction. Off permits strong reduction,
    /// which is required to reach full beta/eta normal form.
    pub weak: bool,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            innermost: false,
            weak: true,
        }
    }
}

/// Named global definitions. A definition is a template: every use site
/// receives its own copy, and the stored term is never reduced in place.
#[derive(Default)]
pub struct Globals {
    bindings: HashMap<Symbol, Term>,
}

impl Globals {
    pub fn get(&self, name: &Symbol) -> Option<&Term> {
        self.bindings.get(name)
    }

    /// Binds `name`, replacing any previous definition.
    pub fn define(&mut self, name: Symbol, template: Term) {
        self.bindings.insert(name, template);
    }

    pub fn unset(&mut self, name: &Symbol) {
        self.bindings.remove(name);
    }
}

#[derive(Default)]
pub struct Evaluator {
    pub strategy: Strategy,
    pub globals: Globals,
}

impl Evaluator {
    /// Applies at most one rewrite to `term`, in place, and reports which.
    /// `None` means the term is in normal form under the active strategy;
    /// callers loop until then. The interner is needed because an alpha
    /// step may mint a fresh symbol.
    pub fn reduce(&self, term: &mut Term, interner: &mut Interner) -> Option<Step> {
        self.step(term, interner, &mut Vec::new())
    }

    /// `shadowed` holds the symbols bound by the abstractions enclosing the
    /// current node; a definition sharing a spelling with any of them is
    /// invisible until that binder's scope is left.
    fn step(
        &self,
        term: &mut Term,
        interner: &mut Interner,
        shadowed: &mut Vec<Symbol>,
    ) -> Option<Step> {
        match term {
            Term::Var(_) => None,
            Term::Abs(_, _) => self.step_abstraction(term, interner, shadowed),
            Term::App(_, _) => self.step_application(term, interner, shadowed),
        }
    }

    fn step_application(
        &self,
        term: &mut Term,
        interner: &mut Interner,
        shadowed: &mut Vec<Symbol>,
    ) -> Option<Step> {
        let Term::App(fun, arg) = term else {
            return None;
        };
        // Definitions unfold only in function position; a name in argument
        // position keeps its spelling until it is itself applied.
        if let Term::Var(name) = fun.as_ref() {
            if !shadowed.contains(name) {
                if let Some(template) = self.globals.get(name) {
                    **fun = template.clone();
                    return Some(Step::Expand);
                }
            }
        }
        if self.strategy.innermost {
            if let Some(step) = self.step(fun, interner, shadowed) {
                return Some(step);
            }
            if let Some(step) = self.step(arg, interner, shadowed) {
                return Some(step);
            }
        }
        if let Term::Abs(param, body) = fun.as_mut() {
            let param = param.clone();
            if resolve_capture(body, &param, arg, interner) {
                return Some(Step::Alpha);
            }
            substitute(body, &param, arg);
            // The rewritten body takes the application's place; the spent
            // shells and the original argument are dropped with it.
            let body = std::mem::replace(body.as_mut(), Term::Var(param));
            *term = body;
            return Some(Step::Beta);
        }
        if let Some(step) = self.step(fun, interner, shadowed) {
            return Some(step);
        }
        self.step(arg, interner, shadowed)
    }

    fn step_abstraction(
        &self,
        term: &mut Term,
        interner: &mut Interner,
        shadowed: &mut Vec<Symbol>,
    ) -> Option<Step> {
        if self.strategy.weak {
            return None;
        }
        let Term::Abs(param, body) = term else {
            return None;
        };
        let param = param.clone();
        // λx. f x collapses to f when x does not occur free in f.
        if let Term::App(fun, arg) = body.as_mut() {
            if matches!(arg.as_ref(), Term::Var(name) if *name == param)
                && !fun.uses_free(&param)
            {
                let fun = std::mem::replace(fun.as_mut(), Term::Var(param));
                *term = fun;
                return Some(Step::Eta);
            }
        }
        shadowed.push(param);
        let step = self.step(body, interner, shadowed);
        shadowed.pop();
        step
    }
}
