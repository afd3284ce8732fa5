use std::fmt::Write;

use ansi_term::Colour;

use crate::{app::state::AppState, error::error_banner};

pub struct ViewOptions {
    /// Total is shown against this value. It's never enforced.
    pub target_hours: f64,
    pub colored: bool,
}

/// Renders the whole application state the same way every time: inputs, error banner, total and
/// the list of records with the ids used for deletion.
pub fn render(state: &AppState, options: &ViewOptions) -> String {
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = write_view(&mut out, state, options);
    out
}

fn write_view(out: &mut String, state: &AppState, options: &ViewOptions) -> std::fmt::Result {
    writeln!(out, "Study log")?;
    writeln!(out, "Topic entered: {}", state.form.study)?;
    writeln!(out, "Hours entered: {}h", state.form.study_time)?;

    let banner = error_banner(state.error());
    if !banner.is_empty() {
        if options.colored {
            writeln!(out, "{}", Colour::Red.paint(banner))?;
        } else {
            writeln!(out, "{banner}")?;
        }
    }

    writeln!(out, "Total: {}/{}(h)", state.total(), options.target_hours)?;
    writeln!(out, "Records")?;
    if state.entries().is_empty() {
        writeln!(out, "  (none)")?;
    }
    for entry in state.entries() {
        writeln!(
            out,
            "  [{}] {}: {}h",
            entry.id, entry.record.title, entry.record.time
        )?;
    }
    Ok(())
}
