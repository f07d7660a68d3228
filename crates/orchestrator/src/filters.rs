use regex::Regex;
use thunderdome_config::HarnessConfig;
use thunderdome_core::{OrchestratorSpec, TaskSpec};

/// CLI-level overrides applied before the trial cross-product is built,
/// mirroring the `run` subcommand's flags.
#[derive(Debug, Clone, Default)]
pub struct CliFilters {
    pub orchestrator: Option<String>,
    pub task: Option<String>,
    pub category: Option<String>,
    pub trials: Option<u32>,
}

/// The filtered subset of the config actually driving this run.
#[derive(Debug, Clone)]
pub struct FilteredConfig {
    pub orchestrators: Vec<OrchestratorSpec>,
    pub tasks: Vec<TaskSpec>,
    pub trials: u32,
}

/// Apply `filters` to `config`. A `trials` override replaces the configured
/// count entirely rather than composing with it.
#[must_use]
pub fn apply_filters(config: &HarnessConfig, filters: &CliFilters) -> FilteredConfig {
    let orchestrators = config
        .orchestrators
        .iter()
        .filter(|o| filters.orchestrator.as_deref().is_none_or(|name| o.name == name))
        .cloned()
        .collect();

    let tasks = config
        .tasks
        .iter()
        .filter(|t| filters.task.as_deref().is_none_or(|name| t.name == name))
        .filter(|t| {
            filters
                .category
                .as_deref()
                .is_none_or(|glob| glob_matches(glob, &t.category))
        })
        .cloned()
        .collect();

    let trials = filters.trials.filter(|t| *t > 0).unwrap_or(config.trials);

    FilteredConfig {
        orchestrators,
        tasks,
        trials,
    }
}

/// Translate a `*`-wildcard glob into an anchored regex and test `value`
/// against it.
fn glob_matches(glob: &str, value: &str) -> bool {
    let mut pattern = String::from("^");
    for part in glob.split('*') {
        pattern.push_str(&regex::escape(part));
        pattern.push_str(".*");
    }
    // Undo the trailing ".*" introduced by the last split segment.
    pattern.truncate(pattern.len() - 2);
    pattern.push('$');

    Regex::new(&pattern).is_ok_and(|re| re.is_match(value))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn orchestrator(name: &str) -> OrchestratorSpec {
        OrchestratorSpec {
            name: name.to_owned(),
            adapter: PathBuf::from("/adapters/x.sh"),
            image: "image:latest".to_owned(),
            env: Default::default(),
        }
    }

    fn task(name: &str, category: &str) -> TaskSpec {
        TaskSpec {
            name: name.to_owned(),
            repo: "https://example.invalid/repo.git".to_owned(),
            tag: "v1".to_owned(),
            reference_tag: None,
            category: category.to_owned(),
            validation_image: "validate:latest".to_owned(),
            install_cmd: None,
            test_cmd: "pytest".to_owned(),
            lint_cmd: None,
            rubric: Vec::new(),
            weights: None,
            time_limit_minutes: 30,
        }
    }

    fn config() -> HarnessConfig {
        HarnessConfig {
            orchestrators: vec![orchestrator("claude-code"), orchestrator("aider")],
            tasks: vec![task("fix-bug", "bugfix"), task("add-feature", "feature")],
            trials: 5,
            proxy: thunderdome_config::ProxyConfig {
                gateway: vec!["gateway".to_owned()],
                log_dir: PathBuf::from("/logs"),
                budget_per_trial_usd: 1.0,
                judge_model: None,
            },
            network: Default::default(),
            secrets: Default::default(),
            results: Default::default(),
        }
    }

    #[test]
    fn no_filters_keeps_everything() {
        let filtered = apply_filters(&config(), &CliFilters::default());
        assert_eq!(filtered.orchestrators.len(), 2);
        assert_eq!(filtered.tasks.len(), 2);
        assert_eq!(filtered.trials, 5);
    }

    #[test]
    fn orchestrator_filter_narrows_to_one() {
        let filters = CliFilters {
            orchestrator: Some("aider".to_owned()),
            ..Default::default()
        };
        let filtered = apply_filters(&config(), &filters);
        assert_eq!(filtered.orchestrators.len(), 1);
        assert_eq!(filtered.orchestrators[0].name, "aider");
    }

    #[test]
    fn category_glob_filters_tasks() {
        let filters = CliFilters {
            category: Some("bug*".to_owned()),
            ..Default::default()
        };
        let filtered = apply_filters(&config(), &filters);
        assert_eq!(filtered.tasks.len(), 1);
        assert_eq!(filtered.tasks[0].name, "fix-bug");
    }

    #[test]
    fn positive_trials_override_replaces_config() {
        let filters = CliFilters {
            trials: Some(9),
            ..Default::default()
        };
        assert_eq!(apply_filters(&config(), &filters).trials, 9);
    }

    #[test]
    fn zero_trials_override_is_ignored() {
        let filters = CliFilters {
            trials: Some(0),
            ..Default::default()
        };
        assert_eq!(apply_filters(&config(), &filters).trials, 5);
    }
}
