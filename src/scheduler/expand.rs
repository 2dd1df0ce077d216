//! Task expansion.
//!
//! Lab subjects become as many double-period tasks as whole pairs fit in
//! their weekly count, plus one single task for an odd remainder. Other
//! subjects become `weekly_count` single tasks. Order is not meaningful;
//! the placer sorts.

use crate::models::{PlacementTask, SubjectPlan};

/// Expands a plan into placement tasks.
pub fn expand_tasks(plan: &SubjectPlan) -> Vec<PlacementTask> {
    let mut tasks = Vec::with_capacity(plan.total_weekly() as usize);
    for subject in plan.iter() {
        let mut remaining = subject.weekly_count;
        if subject.is_lab {
            while remaining >= 2 {
                tasks.push(PlacementTask::double(subject.id));
                remaining -= 2;
            }
        }
        for _ in 0..remaining {
            tasks.push(PlacementTask::single(subject.id, subject.is_lab));
        }
    }
    tasks
}
