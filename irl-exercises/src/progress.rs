use indicatif::{ProgressBar, ProgressStyle};

/// Bar for work with a known number of ticks.
pub fn bar(len: u64, message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>24} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta})")?
            .progress_chars("=>-"),
    );
    bar.set_message(message.into());
    Ok(bar)
}

/// Spinner for loops that stop on convergence rather than after a fixed count.
pub fn spinner(message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} ({pos} sweeps)")?);
    spinner.set_message(message.into());
    Ok(spinner)
}

/// Section header for terminal output.
pub fn section(title: &str) -> String {
    let rule = "=".repeat(60);
    format!("\n{rule}\n{title}\n{rule}")
}
