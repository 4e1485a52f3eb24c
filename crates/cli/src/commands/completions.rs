// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sg completions` - Shell completion scripts
//!
//! ```bash
//! sg completions bash -o ~/.local/share/bash-completion/completions/sg
//! sg completions zsh > ~/.zfunc/_sg
//! ```

use anyhow::{Context, Result};
use clap::{Args, Command};
use clap_complete::{generate, Shell};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: CompletionsArgs, mut cmd: Command) -> Result<()> {
    match &args.output {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            render(args.shell, &mut cmd, &mut file)?;
            tracing::info!(shell = %args.shell, path = %path.display(), "wrote completions");
        }
        None => render(args.shell, &mut cmd, &mut io::stdout().lock())?,
    }
    Ok(())
}

/// The script is registered under the command's own name
fn render(shell: Shell, cmd: &mut Command, out: &mut dyn Write) -> Result<()> {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, out);
    out.flush().context("cannot flush completion script")
}

#[cfg(test)]
#[path = "completions_tests.rs"]
mod tests;
