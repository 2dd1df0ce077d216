//! Subject plan builder.
//!
//! Turns raw requirements into a [`SubjectPlan`] with concrete weekly and
//! daily counts, and optionally fills missing teachers from a pool.
//!
//! # Count derivation
//! - `weekly_count`: `total_slots / subjects`, plus one for subjects whose
//!   input position is below `total_slots % subjects`. Explicit counts are
//!   not subtracted first, so a mix of explicit and derived counts can ask
//!   for more than the week holds; the placer reports that as over capacity.
//! - `max_per_day`: `max(1, ceil(weekly_count / days))`.

use std::collections::HashMap;

use crate::models::{PlannedSubject, SubjectId, SubjectPlan, SubjectRequirement, Teacher};

/// Builds a normalized plan. Pure; never fails.
///
/// # Arguments
/// * `requirements` - Subjects in input order.
/// * `total_slots` - Non-break slots in the week.
/// * `day_count` - Teaching days in the week.
pub fn build_plan(
    requirements: &[SubjectRequirement],
    total_slots: usize,
    day_count: usize,
) -> SubjectPlan {
    let subject_count = requirements.len().max(1);
    let base = total_slots / subject_count;
    let extra = total_slots % subject_count;
    let days = day_count.max(1) as u32;

    let subjects = requirements
        .iter()
        .enumerate()
        .map(|(i, req)| {
            let weekly_count = match req.weekly_count {
                Some(c) => c,
                None => (base + usize::from(i < extra)) as u32,
            };
            let max_per_day = req
                .max_per_day
                .unwrap_or_else(|| weekly_count.div_ceil(days).max(1));

            PlannedSubject {
                id: SubjectId::new(i),
                key: req.effective_key().to_string(),
                subject_id: req.subject_id.clone(),
                name: req.name.clone(),
                teacher_id: req.teacher_id.clone(),
                weekly_count,
                max_per_day,
                is_lab: req.is_lab,
                prefer_morning: req.prefer_morning,
                after_break_only: req.after_break_only,
                avoid_last_period: req.avoid_last_period,
                room: req.room.clone(),
            }
        })
        .collect();

    SubjectPlan::new(subjects)
}

/// Least-loaded teacher selection by specialty.
///
/// Load is the number of weekly periods already committed to a teacher in
/// the current batch. Loads change only through [`record`](Self::record),
/// so a failed class leaves them untouched.
#[derive(Debug, Clone, Default)]
pub struct TeacherAssigner {
    teachers: Vec<Teacher>,
    load: HashMap<String, u32>,
}

impl TeacherAssigner {
    /// Creates an assigner over a teacher pool.
    pub fn new(teachers: Vec<Teacher>) -> Self {
        Self {
            teachers,
            load: HashMap::new(),
        }
    }

    /// Committed weekly periods for a teacher.
    pub fn load_of(&self, teacher_id: &str) -> u32 {
        self.load.get(teacher_id).copied().unwrap_or(0)
    }

    /// Fills `teacher_id` for subjects that have none.
    ///
    /// For each such subject, in plan order, picks the qualified teacher
    /// with the lowest load (ties: pool order). Returns how many subjects
    /// received a teacher.
    pub fn assign(&self, plan: &mut SubjectPlan) -> usize {
        let mut load = self.load.clone();
        for subject in plan.iter() {
            if let Some(t) = &subject.teacher_id {
                *load.entry(t.clone()).or_insert(0) += subject.weekly_count;
            }
        }

        let mut chosen = Vec::new();
        for subject in plan.iter().filter(|s| s.teacher_id.is_none()) {
            let best = self
                .teachers
                .iter()
                .filter(|t| t.can_teach(&subject.subject_id))
                .min_by_key(|t| load.get(&t.id).copied().unwrap_or(0));
            if let Some(teacher) = best {
                *load.entry(teacher.id.clone()).or_insert(0) += subject.weekly_count;
                chosen.push((subject.id, teacher.id.clone()));
            }
        }

        let assigned = chosen.len();
        for (id, teacher_id) in chosen {
            plan.set_teacher(id, teacher_id);
        }
        assigned
    }

    /// Commits a successfully placed plan's teacher loads.
    pub fn record(&mut self, plan: &SubjectPlan) {
        for subject in plan.iter() {
            if let Some(t) = &subject.teacher_id {
                *self.load.entry(t.clone()).or_insert(0) += subject.weekly_count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_even_split_with_remainder() {
        let reqs = vec![
            SubjectRequirement::new("A", "A"),
            SubjectRequirement::new("B", "B"),
            SubjectRequirement::new("C", "C"),
        ];
        let plan = build_plan(&reqs, 25, 5);
        let counts: Vec<u32> = plan.iter().map(|s| s.weekly_count).collect();
        assert_eq!(counts, vec![9, 8, 8]);
        let caps: Vec<u32> = plan.iter().map(|s| s.max_per_day).collect();
        assert_eq!(caps, vec![2, 2, 2]);
    }

    #[test]
    fn test_explicit_counts_kept() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math")
                .with_weekly_count(10)
                .with_max_per_day(2),
            SubjectRequirement::new("SCI", "Science")
                .with_weekly_count(5)
                .with_max_per_day(1),
        ];
        let plan = build_plan(&reqs, 25, 5);
        let math = plan.by_key("MATH").unwrap();
        assert_eq!((math.weekly_count, math.max_per_day), (10, 2));
        let sci = plan.by_key("SCI").unwrap();
        assert_eq!((sci.weekly_count, sci.max_per_day), (5, 1));
    }

    #[test]
    fn test_split_counts_every_subject() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_weekly_count(10),
            SubjectRequirement::new("ART", "Art"),
            SubjectRequirement::new("PE", "Sport"),
        ];
        let plan = build_plan(&reqs, 25, 5);
        let counts: Vec<u32> = plan.iter().map(|s| s.weekly_count).collect();
        assert_eq!(counts, vec![10, 8, 8]);

        // The extra goes by input position, so an explicit subject can hold it.
        let reqs = vec![
            SubjectRequirement::new("ART", "Art").with_weekly_count(2),
            SubjectRequirement::new("PE", "Sport"),
            SubjectRequirement::new("MUS", "Music"),
        ];
        let plan = build_plan(&reqs, 10, 5);
        let counts: Vec<u32> = plan.iter().map(|s| s.weekly_count).collect();
        assert_eq!(counts, vec![2, 3, 3]);
    }

    #[test]
    fn test_split_can_exceed_week() {
        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_weekly_count(20),
            SubjectRequirement::new("ART", "Art"),
        ];
        let plan = build_plan(&reqs, 25, 5);
        assert_eq!(plan.by_key("ART").unwrap().weekly_count, 12);
        assert_eq!(plan.total_weekly(), 32);
    }

    #[test]
    fn test_max_per_day_at_least_one() {
        let reqs = vec![SubjectRequirement::new("ART", "Art").with_weekly_count(1)];
        let plan = build_plan(&reqs, 25, 5);
        assert_eq!(plan.by_key("ART").unwrap().max_per_day, 1);

        let plan = build_plan(&reqs, 25, 0);
        assert_eq!(plan.by_key("ART").unwrap().max_per_day, 1);
    }

    #[test]
    fn test_key_defaults_to_subject_id() {
        let plan = build_plan(&[SubjectRequirement::new("ART", "Art")], 5, 5);
        assert!(plan.by_key("ART").is_some());
    }

    #[test]
    fn test_assigner_least_loaded() {
        let teachers = vec![
            Teacher::new("T1").with_subject("MATH"),
            Teacher::new("T2").with_subject("MATH").with_subject("PHY"),
        ];
        let mut assigner = TeacherAssigner::new(teachers);

        let reqs = vec![
            SubjectRequirement::new("MATH", "Math").with_weekly_count(5),
            SubjectRequirement::new("PHY", "Physics").with_weekly_count(3),
            SubjectRequirement::new("ART", "Art").with_weekly_count(2),
        ];
        let mut plan = build_plan(&reqs, 25, 5);
        assert_eq!(assigner.assign(&mut plan), 2);
        assert_eq!(plan.by_key("MATH").unwrap().teacher_id.as_deref(), Some("T1"));
        assert_eq!(plan.by_key("PHY").unwrap().teacher_id.as_deref(), Some("T2"));
        assert_eq!(plan.by_key("ART").unwrap().teacher_id, None);

        // Loads are committed only on record.
        assert_eq!(assigner.load_of("T1"), 0);
        assigner.record(&plan);
        assert_eq!(assigner.load_of("T1"), 5);

        // Next class: T1 is busier than T2 now, MATH goes to T2.
        let mut next = build_plan(&reqs[..1], 25, 5);
        assigner.assign(&mut next);
        assert_eq!(next.by_key("MATH").unwrap().teacher_id.as_deref(), Some("T2"));
    }

    #[test]
    fn test_assigner_keeps_preassigned() {
        let assigner = TeacherAssigner::new(vec![Teacher::new("T1").with_subject("MATH")]);
        let reqs = vec![SubjectRequirement::new("MATH", "Math").with_teacher("T7")];
        let mut plan = build_plan(&reqs, 10, 5);
        assert_eq!(assigner.assign(&mut plan), 0);
        assert_eq!(plan.by_key("MATH").unwrap().teacher_id.as_deref(), Some("T7"));
    }

    proptest! {
        #[test]
        fn prop_derived_counts_fill_the_week(subjects in 1usize..12, slots in 0usize..60, days in 1usize..7) {
            let reqs: Vec<_> = (0..subjects)
                .map(|i| SubjectRequirement::new(format!("S{i}"), "s"))
                .collect();
            let plan = build_plan(&reqs, slots, days);
            prop_assert_eq!(plan.total_weekly() as usize, slots);
            let max = plan.iter().map(|s| s.weekly_count).max().unwrap_or(0);
            let min = plan.iter().map(|s| s.weekly_count).min().unwrap_or(0);
            prop_assert!(max - min <= 1);
            for s in plan.iter() {
                prop_assert!(s.max_per_day >= 1);
                prop_assert!(s.max_per_day as usize * days >= s.weekly_count as usize);
            }
        }
    }
}
