pub type Span = std::ops::Range<usize>;

#[derive(Clone, Debug)]
pub struct Spanned<T> {
    pub span: Span,
    pub value: T,
}
impl<T> Spanned<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

pub use chumsky::error::Error as _;
pub type Error<I = String> = chumsky::error::Simple<I, Span>;
