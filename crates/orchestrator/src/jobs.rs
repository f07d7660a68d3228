use std::{future::Future, path::PathBuf, sync::Arc};

use thunderdome_core::{OrchestratorSpec, TaskSpec, TrialMeta};

use crate::filters::FilteredConfig;

/// One closure per (orchestrator, task, trial index). Mind the classic
/// "variable capture" hazard: every loop variable below is captured by
/// value (via `Arc::clone`/owned `String`/`PathBuf`), never by reference to
/// a loop-scoped binding.
pub type TrialJob = Box<dyn FnOnce() -> std::pin::Pin<Box<dyn Future<Output = Result<(), String>> + Send>> + Send>;

/// Build the cross-product of (orchestrators × tasks × 1..=trials) as a
/// flat list of jobs. `on_result` records every produced `TrialMeta`
/// (trials that reach the container-launch stage or beyond always produce
/// one); job errors are setup failures and are surfaced
/// through the worker pool's own error collection instead.
pub fn build_trial_jobs(
    config: &FilteredConfig,
    gateway_url: String,
    run_dir: PathBuf,
    allowlist: Vec<String>,
    limits: thunderdome_container::Limits,
    results: Arc<std::sync::Mutex<Vec<TrialMeta>>>,
) -> Vec<TrialJob> {
    let mut jobs: Vec<TrialJob> = Vec::new();
    let allowlist = Arc::new(allowlist);

    for orchestrator in &config.orchestrators {
        let orchestrator = Arc::new(orchestrator.clone());
        for task in &config.tasks {
            let task = Arc::new(task.clone());
            for trial_index in 1..=config.trials {
                let orchestrator = Arc::clone(&orchestrator);
                let task = Arc::clone(&task);
                let allowlist = Arc::clone(&allowlist);
                let gateway_url = gateway_url.clone();
                let run_dir = run_dir.clone();
                let results = Arc::clone(&results);

                jobs.push(Box::new(move || {
                    Box::pin(async move {
                        let request = thunderdome_trial::TrialRequest {
                            orchestrator: &orchestrator,
                            task: &task,
                            trial_index,
                            gateway_url: &gateway_url,
                            run_dir: &run_dir,
                            allowlist: &allowlist,
                            limits,
                        };
                        match thunderdome_trial::run_trial(request).await {
                            Ok(meta) => {
                                results
                                    .lock()
                                    .expect("results mutex is never poisoned by a panic here")
                                    .push(meta);
                                Ok(())
                            }
                            Err(source) => Err(format!(
                                "{}/{}/trial-{trial_index}: {source}",
                                orchestrator.name, task.name
                            )),
                        }
                    })
                }));
            }
        }
    }

    jobs
}
