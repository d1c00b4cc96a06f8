use rustyline::{error::ReadlineError, Editor};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error<E> {
    #[error(transparent)]
    Readline(ReadlineError),
    #[error("Eval failed: {0:?}")]
    EvalError(E),
}

pub trait Repl {
    type Error: std::fmt::Debug;
    const PROMPT: &'static str = ">> ";
    const HISTORY: Option<&'static str> = None;
    fn evaluate(&mut self, input: String) -> Result<(), Self::Error>;
}

pub fn start_repl<R: Repl>(mut repl: R) -> Result<(), Error<R::Error>> {
    let mut editor = Editor::<()>::new();
    if let Some(history) = R::HISTORY {
        editor.load_history(history).ok();
    }
    let mut pending: Option<String> = None;
    loop {
        match editor.readline(R::PROMPT) {
            Ok(mut line) if line.ends_with('\\') => {
                line.pop();
                line.push('\n');
                if let Some(pending) = pending.as_mut() {
                    pending.push_str(line.as_str());
                } else {
                    pending = Some(line);
                }
            }
            Ok(line) => {
                let input = if let Some(mut pending) = pending.take() {
                    pending.push_str(line.as_str());
                    pending
                } else {
                    line
                };
                editor.add_history_entry(input.as_str());
                repl.evaluate(input).map_err(Error::EvalError)?;
                if let Some(history) = R::HISTORY {
                    editor.save_history(history).map_err(Error::Readline)?;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // A ctrl-c at the prompt abandons the pending line.
                pending = None;
            }
            Err(ReadlineError::Eof) => {
                println!("Bye!");
                break Ok(());
            }
            Err(e) => break Err(Error::Readline(e)),
        }
    }
}
