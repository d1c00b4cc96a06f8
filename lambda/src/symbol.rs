use std::{
    collections::HashSet,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

/// An interned identifier. Every occurrence of one spelling interned through
/// the same [`Interner`] is the same symbol, so equality is a pointer
/// comparison rather than a string comparison.
#[derive(Clone, Debug)]
pub struct Symbol(Rc<str>);

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const u8 as usize).hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maps spellings to canonical symbols, inserting on first sight.
#[derive(Default)]
pub struct Interner {
    names: HashSet<Rc<str>>,
}

impl Interner {
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(existing) = self.names.get(name) {
            return Symbol(existing.clone());
        }
        let name: Rc<str> = name.into();
        self.names.insert(name.clone());
        Symbol(name)
    }
}
