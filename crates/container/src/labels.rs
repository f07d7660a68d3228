/// Label applied to every container and network the harness creates, so
/// aggressive cleanup (`--cleanup-aggressive`) can target only harness-owned
/// Docker resources.
pub const HARNESS_LABEL: &str = "thunderdome.managed=true";

/// Per-trial label value, used to recognize resources belonging to one
/// specific trial while debugging a stuck run.
#[must_use]
pub fn trial_label(trial: &str) -> String {
    format!("thunderdome.trial={trial}")
}
