//! Orchestrator services — config assembly, dispatch, ledger, rebuild
//! flows, manifest pull, stuck-job sweep.

pub mod assembler;
pub mod ci_trigger;
pub mod dispatcher;
pub mod ledger;
pub mod manifest;
pub mod rebuild;
pub mod sweeper;
