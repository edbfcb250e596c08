//! CLI output formatting

use crate::core::config::{PluginConfig, WatchRule};
use crate::core::step::StepKind;
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");

/// One-line description of a watch rule
pub fn format_rule(index: usize, rule: &WatchRule) -> String {
    let action = match &rule.step.kind {
        Some(StepKind::Command(command)) => format!("command {}", style(command).cyan()),
        Some(StepKind::Trigger { pipeline, .. }) => format!("trigger {}", style(pipeline).cyan()),
        None => style("no action").yellow().to_string(),
    };

    let group = rule
        .step
        .group
        .as_deref()
        .map(|group| format!(" [{}]", style(group).bold()))
        .unwrap_or_default();

    format!(
        "  {} {} → {}{}",
        style(format!("#{}", index)).dim(),
        rule.paths.join(", "),
        action,
        group
    )
}

/// Summary of a normalized configuration
pub fn format_config_summary(config: &PluginConfig) -> String {
    let mut lines = vec![
        format!("  Diff: {}", style(config.diff_command()).bold()),
        format!("  Watch rules: {}", style(config.watch.len()).cyan()),
        format!("  Hooks: {}", style(config.hooks.len()).cyan()),
        format!("  Env: {}", style(config.env.len()).cyan()),
    ];
    if config.wait {
        lines.push(format!("  {}", style("Waits after generated steps").dim()));
    }
    lines.extend(
        config
            .watch
            .iter()
            .enumerate()
            .map(|(index, rule)| format_rule(index, rule)),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::step::Step;

    #[test]
    fn test_format_rule_mentions_paths_and_action() {
        let mut step = Step::command("make");
        step.group = Some("build".to_string());
        let rule = WatchRule {
            paths: vec!["src/".to_string(), "lib/".to_string()],
            step,
        };

        let line = console::strip_ansi_codes(&format_rule(3, &rule)).to_string();
        assert!(line.contains("#3"));
        assert!(line.contains("src/, lib/"));
        assert!(line.contains("command make"));
        assert!(line.contains("[build]"));
    }

    #[test]
    fn test_format_rule_without_action() {
        let rule = WatchRule {
            paths: vec![],
            step: Step::default(),
        };
        let line = console::strip_ansi_codes(&format_rule(0, &rule)).to_string();
        assert!(line.contains("no action"));
    }
}
