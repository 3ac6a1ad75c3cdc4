use cypherlats_search::{SearchOutcome, SearchStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The answer only.
    #[default]
    Plain,
    /// Answer preceded by a run summary and the best trajectory.
    Detailed,
    /// The whole outcome as pretty JSON.
    Json,
}

const MAX_STEP_LINES: usize = 20;

pub fn format_outcome(outcome: &SearchOutcome, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Plain => outcome.answer.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(outcome)?,
        OutputFormat::Detailed => format_detailed(outcome),
    })
}

fn format_detailed(outcome: &SearchOutcome) -> String {
    let mut out = String::new();
    let short_id: String = outcome.run_id.chars().take(8).collect();

    out.push_str(&format!("═══ Run {} ═══\n", short_id));
    out.push_str(&format!(
        "Started: {}\n",
        outcome.started.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("Question: {}\n", outcome.question));
    out.push_str(&format!(
        "Status: {} | rounds: {} | nodes: {} | height: {} | value: {:.2} | {}\n",
        outcome.status,
        outcome.rounds,
        outcome.nodes,
        outcome.tree_height,
        outcome.best_value,
        format_elapsed(outcome.elapsed_ms)
    ));

    if outcome.status != SearchStatus::Failed {
        out.push('\n');
        for (i, step) in outcome.trajectory.iter().enumerate() {
            out.push_str(&format!("── Step {} ──\n", i + 1));
            out.push_str(&truncate_lines(step, MAX_STEP_LINES));
            out.push('\n');
        }
    }

    out.push_str("\n── Answer ──\n");
    out.push_str(&outcome.answer);
    out.push('\n');
    out
}

fn format_elapsed(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}

fn truncate_lines(text: &str, max: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max {
        return text.to_string();
    }
    format!(
        "{}\n... ({} more lines)",
        lines[..max].join("\n"),
        lines.len() - max
    )
}
