//! User confirmation prompts for irreversible operations

use std::io::{self, Write};

/// What a cutover is about to do
#[derive(Debug, Clone)]
pub struct CutoverSummary {
    /// Plan name or UUID
    pub plan: String,
    /// Workload (VM) names in the plan that will be cut over
    pub workloads: Vec<String>,
}

impl CutoverSummary {
    pub fn new(plan: &str, workloads: Vec<String>) -> Self {
        Self {
            plan: plan.to_string(),
            workloads,
        }
    }

    /// Workload list shortened for display
    fn workload_preview(&self, limit: usize) -> String {
        let mut names: Vec<String> = self
            .workloads
            .iter()
            .take(limit)
            .map(|n| truncate_name(n, 40))
            .collect();
        if self.workloads.len() > limit {
            names.push(format!("... and {} more", self.workloads.len() - limit));
        }
        names.join(", ")
    }
}

/// Ask before cutting over
///
/// Cutover shuts the source VMs down and cannot be undone, so batch mode
/// never implies consent here; only `skip` (from `--yes`) does.
pub fn confirm_cutover(summary: &CutoverSummary, skip: bool, batch_mode: bool) -> io::Result<bool> {
    if skip {
        return Ok(true);
    }
    if batch_mode {
        eprintln!(
            "\nCutover of plan '{}' aborted in batch mode.\n\
             Re-run with --yes to confirm the cutover of {} workload(s).",
            summary.plan,
            summary.workloads.len()
        );
        return Ok(false);
    }

    eprintln!(
        "\n\x1b[1;33mWARNING: CUTOVER IS IRREVERSIBLE\x1b[0m\n\
         \n\
         Plan:      {}\n\
         Workloads: {} ({})\n\
         \n\
         Source VMs will be shut down and the migrated VMs powered on.",
        summary.plan,
        summary.workloads.len(),
        summary.workload_preview(5),
    );

    confirm_action("Proceed with cutover?", false)
}

/// Prompt for a yes/no answer on stderr; default is no
///
/// Returns `true` without prompting when `skip` is set.
pub fn confirm_action(prompt: &str, skip: bool) -> io::Result<bool> {
    if skip {
        return Ok(true);
    }

    eprint!("\n\x1b[1;33m{} [y/N]:\x1b[0m ", prompt);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Truncate a name for display, adding ellipsis if needed
fn truncate_name(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("YES"));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn test_truncate_name_short() {
        assert_eq!(truncate_name("web01", 40), "web01");
    }

    #[test]
    fn test_truncate_name_long() {
        let long = "a-very-long-virtual-machine-name-that-keeps-going";
        let truncated = truncate_name(long, 20);
        assert_eq!(truncated.chars().count(), 20);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_workload_preview_limits_names() {
        let summary = CutoverSummary::new(
            "plan-a",
            (1..=7).map(|i| format!("vm{}", i)).collect(),
        );
        let preview = summary.workload_preview(5);
        assert!(preview.starts_with("vm1, vm2"));
        assert!(preview.ends_with("... and 2 more"));
    }

    #[test]
    fn test_confirm_cutover_batch_mode_refuses() {
        let summary = CutoverSummary::new("plan-a", vec!["vm1".to_string()]);
        assert!(!confirm_cutover(&summary, false, true).unwrap());
    }

    #[test]
    fn test_confirm_cutover_skip() {
        let summary = CutoverSummary::new("plan-a", vec!["vm1".to_string()]);
        assert!(confirm_cutover(&summary, true, true).unwrap());
    }

    #[test]
    fn test_confirm_action_skip() {
        assert!(confirm_action("Continue?", true).unwrap());
    }
}
