//! # Clinic Intake
//!
//! 多步患者登记表单的核心逻辑：步骤状态机、每步字段模式和数据累积控制器。

pub mod controller;
pub mod schema;
pub mod state_machine;

pub use controller::{IntakeSession, IntakeSessionManager, StepOutcome};
pub use schema::{schema_for, FieldKind, FieldRule, StepSchema};
pub use state_machine::{IntakeEvent, IntakeStateMachine, IntakeStep};
