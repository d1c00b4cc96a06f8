use std::fmt;

use crate::{
    ast,
    symbol::{Interner, Symbol},
};

/// A lambda term. Subtrees are exclusively owned, so a tree is torn down by
/// dropping its root; `clone` is a deep copy that shares the symbols.
///
/// The reduction engine rewrites nodes in place through `&mut Term`, which
/// keeps the caller's root handle valid across any number of steps.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    Var(Symbol),
    Abs(Symbol, Box<Term>),
    App(Box<Term>, Box<Term>),
}

impl Term {
    /// True if `name` occurs anywhere in the term, bound or free.
    pub fn uses(&self, name: &Symbol) -> bool {
        match self {
            Term::Var(occurrence) => occurrence == name,
            Term::Abs(param, body) => param == name || body.uses(name),
            Term::App(fun, arg) => fun.uses(name) || arg.uses(name),
        }
    }

    /// True if `name` occurs free, i.e. outside any abstraction rebinding it.
    pub fn uses_free(&self, name: &Symbol) -> bool {
        match self {
            Term::Var(occurrence) => occurrence == name,
            Term::Abs(param, body) => param != name && body.uses_free(name),
            Term::App(fun, arg) => fun.uses_free(name) || arg.uses_free(name),
        }
    }
}

/// Builds a core term from the surface syntax, interning every identifier.
pub fn resolve(term: &ast::Term, interner: &mut Interner) -> Term {
    match term {
        ast::Term::Var(name) => Term::Var(interner.intern(name)),
        ast::Term::Abs(param, body) => Term::Abs(
            interner.intern(param),
            Box::new(resolve(body, interner)),
        ),
        ast::Term::App(fun, arg) => Term::App(
            Box::new(resolve(fun, interner)),
            Box::new(resolve(arg, interner)),
        ),
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::Abs(param, body) => write!(f, "(λ{param}.{body})"),
            Term::App(fun, arg) => {
                // Application associates to the left, so only an argument
                // that is itself an application needs parentheses.
                if matches!(arg.as_ref(), Term::App(_, _)) {
                    write!(f, "{fun} ({arg})")
                } else {
                    write!(f, "{fun} {arg}")
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn build(input: &str, interner: &mut Interner) -> Term {
        match crate::parser::parse_line(input).unwrap() {
            ast::Input::Term(term) => resolve(&term, interner),
            input => panic!("expected a term, got {input:?}"),
        }
    }

    #[test]
    fn occurrence_queries() {
        let mut interner = Interner::default();
        let term = build("(λx.x y) x", &mut interner);
        let x = interner.intern("x");
        let y = interner.intern("y");
        let z = interner.intern("z");
        assert!(term.uses(&x));
        assert!(term.uses(&y));
        assert!(!term.uses(&z));
        // The trailing `x` is free, the one under the binder is not.
        assert!(term.uses_free(&x));
        assert!(term.uses_free(&y));

        let shadowed = build("λx.x", &mut interner);
        assert!(shadowed.uses(&x));
        assert!(!shadowed.uses_free(&x));
    }

    #[test]
    fn clone_is_independent() {
        let mut interner = Interner::default();
        let mut term = build("(λx.x) y", &mut interner);
        let copy = term.clone();
        let evaluator = crate::eval::Evaluator::default();
        evaluator.reduce(&mut term, &mut interner).unwrap();
        assert_ne!(term, copy);
        assert_eq!(format!("{copy}"), "(λx.x) y");
    }

    #[test]
    fn rendering() {
        let mut interner = Interner::default();
        for (input, expected) in [
            ("a b c", "a b c"),
            ("a (b c)", "a (b c)"),
            ("'x. x y", "(λx.x y)"),
            ("(λf.λx.f x) g", "(λf.(λx.f x)) g"),
        ] {
            let term = build(input, &mut interner);
            assert_eq!(format!("{term}"), expected);
        }
    }
}
