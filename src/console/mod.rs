//! Interactive console: mode banner, menu loop, prompts.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::error;

use crate::observability::metrics::get_metrics;
use crate::sync::{AvatarSource, AvatarSync, ConsolePolicy, IdentityStore, ProfileStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    UpdateImages,
    ValidateEmails,
    Metrics,
    Exit,
}

impl MenuChoice {
    /// Unknown input exits, like `Q`.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "1" => MenuChoice::UpdateImages,
            "2" => MenuChoice::ValidateEmails,
            "m" => MenuChoice::Metrics,
            _ => MenuChoice::Exit,
        }
    }
}

/// Tell the operator which mode is active and wait for Enter.
pub fn announce_mode<R: BufRead, W: Write>(dry_run: bool, input: &mut R, output: &mut W) -> Result<()> {
    let mode = if dry_run { "Dry Run" } else { "For Real" };
    writeln!(output, "\nThe program will run in '{}' mode. Press Enter to continue...", mode)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(())
}

fn print_menu<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "1) Update images")?;
    writeln!(output, "2) Validate emails")?;
    writeln!(output, "M) Show metrics")?;
    writeln!(output, "Q) Exit")?;
    output.flush()?;
    Ok(())
}

/// Run the menu until the operator exits or input ends.
///
/// A failed workflow is logged and the menu comes back.
pub async fn run_menu<P, A, I, R, W>(app: &AvatarSync<P, A, I>, input: &mut R, output: &mut W) -> Result<()>
where
    P: ProfileStore,
    A: AvatarSource,
    I: IdentityStore,
    R: BufRead,
    W: Write,
{
    loop {
        print_menu(output)?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }

        match MenuChoice::parse(&line) {
            MenuChoice::UpdateImages => {
                let mut policy = ConsolePolicy::new(input, output);
                match app.update_images(&mut policy).await {
                    Ok(report) => writeln!(output, "\n{:?}", report)?,
                    Err(e) => error!("update images failed: {:#}", e),
                }
            }
            MenuChoice::ValidateEmails => {
                let mut policy = ConsolePolicy::new(input, output);
                match app.validate_emails(&mut policy).await {
                    Ok(report) => writeln!(output, "\n{:?}", report)?,
                    Err(e) => error!("validate emails failed: {:#}", e),
                }
            }
            MenuChoice::Metrics => {
                let rendered = get_metrics().await.render()?;
                writeln!(output, "{}", rendered)?;
            }
            MenuChoice::Exit => return Ok(()),
        }
    }
}
