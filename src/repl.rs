use std::io;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::remote::Calendar;
use crate::render;
use crate::shell::{Flow, Shell};

/// Read lines until `exit` or Ctrl-D. History lives for the session only.
pub async fn run<C: Calendar>(mut shell: Shell<C>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(&shell.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        log::debug!("Could not add history entry: {}", e);
                    }
                }

                match shell.execute(&line, &mut io::stdout(), &mut io::stderr()).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Clear) => {
                        if let Err(e) = rl.clear_screen() {
                            eprintln!("{}", render::error(e));
                        }
                    }
                    Ok(Flow::Exit) => break,
                    Err(e) => eprintln!("{}", render::error(format!("{:#}", e))),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
