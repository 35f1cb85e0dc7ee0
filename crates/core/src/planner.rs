use crate::models::{PlanStep, ReductionPlan};

pub const DEFAULT_REDUCTION_PERCENT: f64 = 20.0;
pub const PLAN_TIMELINE_MONTHS: u8 = 3;

struct StepTemplate {
    focus: &'static str,
    action: &'static str,
    share: f64,
}

const PLAN_STEPS: [StepTemplate; 3] = [
    StepTemplate {
        focus: "Transport",
        action: "Reduce car travel by 10%",
        share: 0.05,
    },
    StepTemplate {
        focus: "Energy",
        action: "Switch 30% to renewable energy",
        share: 0.08,
    },
    StepTemplate {
        focus: "Food",
        action: "Reduce meat consumption by 2 meals/week",
        share: 0.07,
    },
];

/// Three-month reduction plan for a user's current monthly emissions.
///
/// Missing inputs fall back to zero emissions and a 20% reduction target.
pub fn build_reduction_plan(
    monthly_co2e: Option<f64>,
    reduction_percent: Option<f64>,
) -> ReductionPlan {
    let current = monthly_co2e.unwrap_or(0.0);
    let reduction = reduction_percent.unwrap_or(DEFAULT_REDUCTION_PERCENT);

    let steps = PLAN_STEPS
        .iter()
        .zip(1..)
        .map(|(step, month)| PlanStep {
            month,
            focus: step.focus.to_string(),
            action: step.action.to_string(),
            expected_reduction: current * step.share,
        })
        .collect();

    ReductionPlan {
        target_reduction: reduction,
        current_monthly_emissions: current,
        target_monthly_emissions: current * (1.0 - reduction / 100.0),
        timeline_months: PLAN_TIMELINE_MONTHS,
        steps,
    }
}
