//! One module per subcommand. Each loads whatever config it needs and
//! delegates immediately to the owning crate (`thunderdome-orchestrator`,
//! `thunderdome-report`, or a re-score pass over `thunderdome-trial`'s
//! validation pipeline) — no orchestration logic lives here.

pub mod list;
pub mod report;
pub mod run;
pub mod validate;
