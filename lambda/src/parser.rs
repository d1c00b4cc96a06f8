use chumsky::prelude::*;
use thiserror::Error;

use crate::{ast, prelude::*};

pub trait SimpleParser<I: Clone + std::hash::Hash, O>:
    Parser<I, O, Error = Error<I>> + Clone
{
    #[allow(clippy::type_complexity)]
    fn spanned(self) -> chumsky::combinator::MapWithSpan<Self, fn(O, Span) -> Spanned<O>, O>
    where
        Self: Sized,
        I: std::cmp::Eq,
    {
        self.map_with_span(|value, span| Spanned { span, value })
    }
}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Error<I>> + Clone
{
}

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = ".")]
    Dot,
    #[display(fmt = "=")]
    Equal,
    #[display(fmt = "!inner")]
    Inner,
    #[display(fmt = "!strong")]
    Strong,
    #[display(fmt = "!step")]
    Step,
    #[display(fmt = "!unset")]
    Unset,
    #[display(fmt = "{}", "_0")]
    Ident(String),
}

pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    let token = choice((
        just("!inner").to(Token::Inner),
        just("!strong").to(Token::Strong),
        just("!step").to(Token::Step),
        just("!unset").to(Token::Unset),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('λ').to(Token::Lambda),
        // ASCII spelling of the lambda glyph.
        just('\'').to(Token::Lambda),
        just('.').to(Token::Dot),
        just('=').to(Token::Equal),
        filter(|c: &char| c.is_ascii_alphanumeric())
            .repeated()
            .at_least(1)
            .collect::<String>()
            .map(Token::Ident),
    ));
    token.spanned().padded().repeated().then_ignore(end())
}

fn ident() -> impl SimpleParser<Token, String> {
    select! { Token::Ident(name) => name }
}

fn term_parser() -> impl SimpleParser<Token, ast::Term> {
    recursive(|term| {
        let variable = ident().map(ast::Term::Var).labelled("variable");

        // λx. body — the body extends as far right as possible.
        let abstraction = just(Token::Lambda)
            .ignore_then(ident())
            .then_ignore(just(Token::Dot))
            .then(term.clone())
            .map(|(param, body)| ast::Term::Abs(param, Box::new(body)))
            .labelled("abstraction");

        let atom = choice((
            variable,
            term.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
            abstraction,
        ));

        // Juxtaposition is application and associates to the left.
        atom.clone()
            .then(atom.repeated())
            .foldl(|fun, arg| ast::Term::App(Box::new(fun), Box::new(arg)))
    })
    .labelled("term")
}

fn command_parser() -> impl SimpleParser<Token, ast::Command> {
    let toggle = ident().try_map(|word, span| match word.as_str() {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(Error::custom(
            span,
            format!("expected `on` or `off`, found `{word}`"),
        )),
    });
    choice((
        just(Token::Inner)
            .ignore_then(toggle.clone())
            .map(ast::Command::SetInnermost),
        just(Token::Strong)
            .ignore_then(toggle.clone())
            .map(ast::Command::SetStrong),
        just(Token::Step)
            .ignore_then(toggle)
            .map(ast::Command::SetSingleStep),
        just(Token::Unset).ignore_then(ident()).map(ast::Command::Unset),
    ))
    .labelled("command")
}

fn input_parser() -> impl SimpleParser<Token, ast::Input> {
    let define = ident()
        .then_ignore(just(Token::Equal))
        .then(term_parser())
        .map(|(name, term)| ast::Input::Define(name, term));
    choice((
        command_parser().map(ast::Input::Command),
        define,
        term_parser().map(ast::Input::Term),
    ))
}

/// Malformed input. Carries one diagnostic per parse error; no state has
/// changed when this is returned.
#[derive(Debug, Error)]
#[error("no parse")]
pub struct ParseFailure(pub Vec<Error<String>>);

pub fn parse_line(s: &str) -> Result<ast::Input, ParseFailure> {
    let len = s.chars().count();
    let eoi = Span {
        start: len,
        end: len + 1,
    };
    let tokens = lexer().parse(s).map_err(|es| {
        ParseFailure(es.into_iter().map(|e| e.map(|c| c.to_string())).collect())
    })?;
    input_parser()
        .then_ignore(end())
        .parse(chumsky::Stream::from_iter(
            eoi,
            tokens
                .into_iter()
                .map(|Spanned { span, value }| (value, span)),
        ))
        .map_err(|es| ParseFailure(es.into_iter().map(|e| e.map(|t| t.to_string())).collect()))
}
