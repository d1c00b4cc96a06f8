use crate::{
    symbol::{Interner, Symbol},
    term::Term,
};

/// Replaces every free occurrence of `var` in `term` with an independent
/// copy of `replacement`, in place.
///
/// Capture is not avoided here: callers must first run [`resolve_capture`]
/// until it reports no clash, or know that none is possible (as when a bound
/// symbol is renamed to a fresh one).
pub fn substitute(term: &mut Term, var: &Symbol, replacement: &Term) {
    match term {
        Term::Var(name) => {
            if &*name == var {
                *term = replacement.clone();
            }
        }
        Term::Abs(param, body) => {
            if &*param != var {
                substitute(body, var, replacement);
            }
        }
        Term::App(fun, arg) => {
            substitute(fun, var, replacement);
            substitute(arg, var, replacement);
        }
    }
}

/// Renames abstraction parameters in `term` that would capture a free
/// variable of `replacement` once free occurrences of `var` are substituted.
///
/// A parameter `x` clashes when it differs from `var`, `var` occurs free in
/// its body, and `x` itself occurs free in `replacement`. Renaming one clash
/// (and any clashes exposed beneath it) consumes a whole rewrite step, so
/// the function returns `true` without the caller substituting; substitution
/// is safe once a call returns `false`.
pub fn resolve_capture(
    term: &mut Term,
    var: &Symbol,
    replacement: &Term,
    interner: &mut Interner,
) -> bool {
    match term {
        Term::Var(_) => false,
        Term::Abs(param, body) => {
            if &*param != var && body.uses_free(var) {
                if replacement.uses_free(param) {
                    let fresh = fresh_symbol(interner, body, replacement);
                    let clashed = std::mem::replace(param, fresh.clone());
                    substitute(body, &clashed, &Term::Var(fresh));
                    resolve_capture(body, var, replacement, interner);
                    return true;
                }
                return resolve_capture(body, var, replacement, interner);
            }
            false
        }
        Term::App(fun, arg) => {
            resolve_capture(fun, var, replacement, interner)
                || resolve_capture(arg, var, replacement, interner)
        }
    }
}

/// Returns a symbol that occurs nowhere in `avoid` and does not occur free
/// in `avoid_free`. Candidates are enumerated deterministically as
/// `a, b, …, z, aa, ab, …`; both terms are finite, so this terminates.
pub fn fresh_symbol(interner: &mut Interner, avoid: &Term, avoid_free: &Term) -> Symbol {
    let mut n = 0;
    loop {
        let candidate = interner.intern(&spell(n));
        if !avoid.uses(&candidate) && !avoid_free.uses_free(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn spell(mut n: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    letters.into_iter().rev().collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{ast, term};

    fn build(input: &str, interner: &mut Interner) -> Term {
        match crate::parser::parse_line(input).unwrap() {
            ast::Input::Term(t) => term::resolve(&t, interner),
            input => panic!("expected a term, got {input:?}"),
        }
    }

    #[test]
    fn candidate_spellings() {
        assert_eq!(spell(0), "a");
        assert_eq!(spell(1), "b");
        assert_eq!(spell(25), "z");
        assert_eq!(spell(26), "aa");
        assert_eq!(spell(27), "ab");
        assert_eq!(spell(52), "ba");
    }

    #[test]
    fn fresh_symbol_skips_used_names() {
        let mut interner = Interner::default();
        let avoid = build("a (λb.c)", &mut interner);
        let avoid_free = build("λd.d e", &mut interner);
        // a, b, c are used in the first term; d is bound (not free) in the
        // second, so it is acceptable before e even comes up.
        let fresh = fresh_symbol(&mut interner, &avoid, &avoid_free);
        assert_eq!(format!("{fresh}"), "d");
    }

    #[test]
    fn substitute_respects_shadowing() {
        let mut interner = Interner::default();
        let mut term = build("x (λx.x) (λy.x)", &mut interner);
        let x = interner.intern("x");
        let replacement = build("f g", &mut interner);
        substitute(&mut term, &x, &replacement);
        assert_eq!(format!("{term}"), "f g (λx.x) (λy.f g)");
    }

    #[test]
    fn substitution_copies_are_independent() {
        let mut interner = Interner::default();
        let mut term = build("x x", &mut interner);
        let x = interner.intern("x");
        let replacement = build("λy.y", &mut interner);
        substitute(&mut term, &x, &replacement);
        let Term::App(fun, arg) = term else {
            panic!("expected an application");
        };
        assert_eq!(fun, arg);
        assert_eq!(format!("{replacement}"), "(λy.y)");
    }

    #[test]
    fn clash_is_renamed_before_substitution() {
        let mut interner = Interner::default();
        // Substituting y for x under λy would capture the free y.
        let mut body = build("λy.x", &mut interner);
        let x = interner.intern("x");
        let replacement = build("y", &mut interner);
        assert!(resolve_capture(&mut body, &x, &replacement, &mut interner));
        assert_eq!(format!("{body}"), "(λa.x)");
        // The tree is now clash-free; substitution cannot capture.
        assert!(!resolve_capture(&mut body, &x, &replacement, &mut interner));
        substitute(&mut body, &x, &replacement);
        assert_eq!(format!("{body}"), "(λa.y)");
    }

    #[test]
    fn unclashed_binders_are_left_alone() {
        let mut interner = Interner::default();
        // λy binds y, but y is not free in the replacement, so no rename.
        let mut body = build("λy.x y", &mut interner);
        let x = interner.intern("x");
        let replacement = build("λz.z", &mut interner);
        assert!(!resolve_capture(&mut body, &x, &replacement, &mut interner));
        substitute(&mut body, &x, &replacement);
        assert_eq!(format!("{body}"), "(λy.(λz.z) y)");
    }

    #[test]
    fn nested_clashes_resolve_in_one_pass() {
        let mut interner = Interner::default();
        // Both binders capture free variables of the replacement.
        let mut body = build("λy.λz.x", &mut interner);
        let x = interner.intern("x");
        let replacement = build("y z", &mut interner);
        assert!(resolve_capture(&mut body, &x, &replacement, &mut interner));
        assert!(!resolve_capture(&mut body, &x, &replacement, &mut interner));
        substitute(&mut body, &x, &replacement);
        // Each rename only avoids the binder's own body and the replacement,
        // so both binders end up with the first safe candidate.
        assert_eq!(format!("{body}"), "(λa.(λa.y z))");
    }
}
