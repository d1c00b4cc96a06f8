use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{Context as _, Result};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use util::repl;

use crate::{
    eval::{Evaluator, Step},
    parser::ParseFailure,
    prelude::*,
    symbol::Interner,
    term::Term,
};

mod ast;
mod eval;
mod parser;
mod prelude;
mod subst;
mod symbol;
mod term;

/// Set by the SIGINT handler, consulted (and cleared) by the evaluation loop
/// between reduction steps. A step that has begun always runs to completion.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn build_report(e: Error<String>) -> Report<Span> {
    use chumsky::error::SimpleReason;
    let report = Report::build(ReportKind::Error, (), e.span().start);
    match e.reason() {
        SimpleReason::Unexpected => {
            let found = e.found().map(String::as_str).unwrap_or("end of the line");
            let expected = e
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of the line"))
                .collect::<Vec<_>>()
                .join(", ");
            let expected = if expected.is_empty() {
                "something else".into()
            } else {
                expected
            };
            report
                .with_message(format!("Unexpected {found}, expected {expected}"))
                .with_label(
                    Label::new(e.span())
                        .with_message(format!("Unexpected {}", found.fg(Color::Red)))
                        .with_color(Color::Red),
                )
        }
        SimpleReason::Unclosed { span, delimiter } => report
            .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
            .with_label(
                Label::new(span.clone())
                    .with_message("Opened here")
                    .with_color(Color::Yellow),
            )
            .with_label(
                Label::new(e.span())
                    .with_message("Expected it to be closed by here")
                    .with_color(Color::Red),
            ),
        SimpleReason::Custom(msg) => report.with_message(msg).with_label(
            Label::new(e.span())
                .with_message(format!("{}", msg.fg(Color::Red)))
                .with_color(Color::Red),
        ),
    }
    .finish()
}

fn report_failure(input: &str, ParseFailure(errors): ParseFailure) {
    for e in errors {
        build_report(e).eprint(Source::from(&input)).ok();
    }
}

/// Blocks until the user sends a line; EOF asks to stop stepping.
fn step_pause() -> Result<bool> {
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        println!();
        return Ok(false);
    }
    Ok(true)
}

struct Session {
    interner: Interner,
    evaluator: Evaluator,
    single_step: bool,
    echo: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            interner: Interner::default(),
            evaluator: Evaluator::default(),
            single_step: false,
            // Stays off while files given on the command line are loaded.
            echo: false,
        }
    }

    fn run_line(&mut self, line: &str) -> Result<()> {
        let input = match parser::parse_line(line) {
            Ok(input) => input,
            Err(failure) => {
                report_failure(line, failure);
                return Ok(());
            }
        };
        match input {
            ast::Input::Command(command) => self.apply(command),
            ast::Input::Define(name, template) => {
                let name = self.interner.intern(&name);
                let template = term::resolve(&template, &mut self.interner);
                self.evaluator.globals.define(name.clone(), template);
                // A definition evaluates to its name.
                self.evaluate_term(Term::Var(name))?;
            }
            ast::Input::Term(term) => {
                let term = term::resolve(&term, &mut self.interner);
                self.evaluate_term(term)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, command: ast::Command) {
        match command {
            ast::Command::SetInnermost(on) => self.evaluator.strategy.innermost = on,
            ast::Command::SetStrong(on) => self.evaluator.strategy.weak = !on,
            ast::Command::SetSingleStep(on) => self.single_step = on,
            ast::Command::Unset(name) => {
                let name = self.interner.intern(&name);
                self.evaluator.globals.unset(&name);
            }
        }
    }

    fn evaluate_term(&mut self, mut term: Term) -> Result<()> {
        // A bound name on its own stands for its definition; this single
        // substitution is not a reduction step and is not traced.
        if let Term::Var(name) = &term {
            if let Some(template) = self.evaluator.globals.get(name) {
                term = template.clone();
            }
        }
        let mut last: Option<Step> = None;
        let mut interrupted = false;
        loop {
            if self.single_step {
                match last {
                    Some(step) => print!("({step}) {term}"),
                    None => print!("(*) {term}"),
                }
                std::io::stdout().flush()?;
                if !step_pause()? {
                    interrupted = true;
                    break;
                }
            }
            if INTERRUPTED.swap(false, Ordering::SeqCst) {
                interrupted = true;
                break;
            }
            match self.evaluator.reduce(&mut term, &mut self.interner) {
                Some(step) => last = Some(step),
                None => break,
            }
        }
        if interrupted {
            println!("Interrupted");
        } else if self.echo && !self.single_step {
            println!("{term}");
        }
        // A ctrl-c that lands after the last step is consulted would
        // otherwise cancel the next evaluation.
        INTERRUPTED.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn load(&mut self, path: &str) -> Result<()> {
        let source =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        for line in source.lines() {
            if !line.is_empty() {
                self.run_line(line)?;
            }
        }
        Ok(())
    }
}

impl repl::Repl for Session {
    type Error = anyhow::Error;
    const PROMPT: &'static str = "+ ";
    const HISTORY: Option<&'static str> = Some("/tmp/lambda.history");

    fn evaluate(&mut self, input: String) -> Result<(), Self::Error> {
        if input.is_empty() {
            return Ok(());
        }
        self.run_line(&input)
    }
}

fn main() -> Result<()> {
    ctrlc::set_handler(|| INTERRUPTED.store(true, Ordering::SeqCst))
        .context("failed to install the interrupt handler")?;
    let mut session = Session::new();
    for path in std::env::args().skip(1) {
        session.load(&path)?;
    }
    session.echo = true;
    repl::start_repl(session)?;
    Ok(())
}
