//! 登记步骤状态机
//!
//! 管理多步登记表单的步骤推进：每一步校验通过后前进一步，
//! 最后一步完成后进入终态 Submitted。

use clinic_core::{ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 登记表单步骤
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    PatientInfo,
    EmergencyContact,
    Insurance,
    Allergies,
    Medications,
    Submitted,
}

impl IntakeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeStep::PatientInfo => "patient-info",
            IntakeStep::EmergencyContact => "emergency-contact",
            IntakeStep::Insurance => "insurance",
            IntakeStep::Allergies => "allergies",
            IntakeStep::Medications => "medications",
            IntakeStep::Submitted => "submitted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "patient-info" => Some(IntakeStep::PatientInfo),
            "emergency-contact" => Some(IntakeStep::EmergencyContact),
            "insurance" => Some(IntakeStep::Insurance),
            "allergies" => Some(IntakeStep::Allergies),
            "medications" => Some(IntakeStep::Medications),
            "submitted" => Some(IntakeStep::Submitted),
            _ => None,
        }
    }
}

/// 步骤转换事件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IntakeEvent {
    /// 当前步骤校验通过
    StepCompleted,
    /// 返回上一步
    Back,
}

/// 登记步骤状态机
#[derive(Debug)]
pub struct IntakeStateMachine {
    transitions: HashMap<(IntakeStep, IntakeEvent), IntakeStep>,
}

impl IntakeStateMachine {
    /// 创建新的状态机实例
    pub fn new() -> Self {
        let mut transitions = HashMap::new();

        // 正向推进规则
        let order = Self::ordered_steps();
        for pair in order.windows(2) {
            transitions.insert((pair[0], IntakeEvent::StepCompleted), pair[1]);
        }
        transitions.insert((IntakeStep::Medications, IntakeEvent::StepCompleted), IntakeStep::Submitted);

        // 回退规则：除第一步外每步可返回上一步，终态不可回退
        for pair in order.windows(2) {
            transitions.insert((pair[1], IntakeEvent::Back), pair[0]);
        }

        Self { transitions }
    }

    /// 检查状态转换是否有效
    pub fn can_transition(&self, from: &IntakeStep, event: &IntakeEvent) -> bool {
        self.transitions.contains_key(&(*from, *event))
    }

    /// 执行状态转换
    pub fn transition(&self, from: &IntakeStep, event: &IntakeEvent) -> Result<IntakeStep> {
        match self.transitions.get(&(*from, *event)) {
            Some(to) => Ok(*to),
            None => Err(ClinicError::InvalidStepTransition {
                from: from.as_str().to_string(),
                event: format!("{:?}", event),
            }),
        }
    }

    /// 表单步骤的固定顺序（不含终态）
    pub fn ordered_steps() -> Vec<IntakeStep> {
        vec![
            IntakeStep::PatientInfo,
            IntakeStep::EmergencyContact,
            IntakeStep::Insurance,
            IntakeStep::Allergies,
            IntakeStep::Medications,
        ]
    }

    /// 获取状态的所有可能事件
    pub fn possible_events(&self, current: &IntakeStep) -> Vec<IntakeEvent> {
        self.transitions
            .keys()
            .filter(|(step, _)| step == current)
            .map(|(_, event)| *event)
            .collect()
    }
}

impl Default for IntakeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let sm = IntakeStateMachine::new();

        assert_eq!(
            sm.transition(&IntakeStep::PatientInfo, &IntakeEvent::StepCompleted).unwrap(),
            IntakeStep::EmergencyContact
        );
        assert_eq!(
            sm.transition(&IntakeStep::Medications, &IntakeEvent::StepCompleted).unwrap(),
            IntakeStep::Submitted
        );
    }

    #[test]
    fn test_back_transitions() {
        let sm = IntakeStateMachine::new();

        assert_eq!(
            sm.transition(&IntakeStep::Insurance, &IntakeEvent::Back).unwrap(),
            IntakeStep::EmergencyContact
        );
        // 第一步不可回退
        assert!(!sm.can_transition(&IntakeStep::PatientInfo, &IntakeEvent::Back));
    }

    #[test]
    fn test_submitted_is_terminal() {
        let sm = IntakeStateMachine::new();

        assert!(!sm.can_transition(&IntakeStep::Submitted, &IntakeEvent::StepCompleted));
        assert!(!sm.can_transition(&IntakeStep::Submitted, &IntakeEvent::Back));
        assert!(sm.possible_events(&IntakeStep::Submitted).is_empty());
    }

    #[test]
    fn test_invalid_transition_error() {
        let sm = IntakeStateMachine::new();

        let err = sm
            .transition(&IntakeStep::Submitted, &IntakeEvent::StepCompleted)
            .unwrap_err();
        assert!(matches!(err, ClinicError::InvalidStepTransition { .. }));
    }

    #[test]
    fn test_step_round_trip() {
        for step in IntakeStateMachine::ordered_steps() {
            assert_eq!(IntakeStep::parse(step.as_str()), Some(step));
        }
        assert_eq!(IntakeStep::parse("unknown-step"), None);
    }
}
