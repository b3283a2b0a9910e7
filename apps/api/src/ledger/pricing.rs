//! Static token price table for billable actions.

use serde::{Deserialize, Serialize};

use crate::models::task::TaskType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    ResumeAnalysis,
    OptimizeResume,
    CoverLetter,
    LearningPath,
    InterviewPrep,
    TokenCredit,
    TokenPurchase,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::ResumeAnalysis => "resume_analysis",
            ActivityType::OptimizeResume => "optimize_resume",
            ActivityType::CoverLetter => "cover_letter",
            ActivityType::LearningPath => "learning_path",
            ActivityType::InterviewPrep => "interview_prep",
            ActivityType::TokenCredit => "token_credit",
            ActivityType::TokenPurchase => "token_purchase",
        }
    }

    pub fn for_task(task_type: TaskType) -> ActivityType {
        match task_type {
            TaskType::OptimizeResume => ActivityType::OptimizeResume,
            TaskType::CoverLetter => ActivityType::CoverLetter,
            TaskType::LearningPath => ActivityType::LearningPath,
            TaskType::InterviewPrep => ActivityType::InterviewPrep,
        }
    }
}

/// Fixed token cost per action. Credits are free to record.
pub const fn price_for(activity: ActivityType) -> i64 {
    match activity {
        ActivityType::ResumeAnalysis => 10,
        ActivityType::OptimizeResume => 15,
        ActivityType::CoverLetter => 20,
        ActivityType::LearningPath => 25,
        ActivityType::InterviewPrep => 40,
        ActivityType::TokenCredit | ActivityType::TokenPurchase => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table() {
        assert_eq!(price_for(ActivityType::ResumeAnalysis), 10);
        assert_eq!(price_for(ActivityType::OptimizeResume), 15);
        assert_eq!(price_for(ActivityType::CoverLetter), 20);
        assert_eq!(price_for(ActivityType::LearningPath), 25);
        assert_eq!(price_for(ActivityType::InterviewPrep), 40);
    }

    #[test]
    fn test_credits_cost_nothing() {
        assert_eq!(price_for(ActivityType::TokenCredit), 0);
        assert_eq!(price_for(ActivityType::TokenPurchase), 0);
    }

    #[test]
    fn test_every_task_type_maps_to_an_activity() {
        assert_eq!(
            ActivityType::for_task(TaskType::OptimizeResume),
            ActivityType::OptimizeResume
        );
        assert_eq!(
            ActivityType::for_task(TaskType::InterviewPrep),
            ActivityType::InterviewPrep
        );
    }
}
