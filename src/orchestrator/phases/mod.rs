//! Orchestrator phases: pipeline stages that touch the workspace directly.
//!
//! - **Stage 1: Preparation** (`prep`) - Output directory reset
//!
//! Stages that only wrap an external tool live in `executor`, `source` and
//! `release`.

pub mod prep;

pub use prep::prepare_output_dir;
