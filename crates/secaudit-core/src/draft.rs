//! Audit draft model
//!
//! Local, unsaved questionnaire state. Edits addressed to a category the
//! draft does not hold, or to a unit index past the end, are silent no-ops.

use secaudit_model::{
    check_unit_count, Answers, CategoryAnswer, DetailField, DetailValue, UnitDetail,
    ValidationError,
};

/// Editable copy of an audit's answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    answers: Answers,
    max_units: usize,
}

impl Default for AuditDraft {
    fn default() -> Self {
        Self::new(Answers::new())
    }
}

/// Answered vs. total categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Categories with at least one declared unit
    pub answered: usize,
    /// Categories in the draft
    pub total: usize,
}

impl AuditDraft {
    /// Wrap answers
    #[inline]
    #[must_use]
    pub fn new(answers: Answers) -> Self {
        Self {
            answers,
            max_units: CategoryAnswer::MAX_UNITS,
        }
    }

    /// Cap on units per category, clamped to [`CategoryAnswer::MAX_UNITS`]
    #[inline]
    #[must_use]
    pub fn with_max_units(mut self, max_units: usize) -> Self {
        self.max_units = max_units.min(CategoryAnswer::MAX_UNITS);
        self
    }

    /// Current unit cap
    #[inline]
    #[must_use]
    pub fn max_units(&self) -> usize {
        self.max_units
    }

    /// Reconcile stored answers against the current category set
    ///
    /// Every category gets an entry; stored entries are kept verbatim,
    /// including categories no longer in the set. Missing ones start empty.
    #[must_use]
    pub fn reconcile(stored: &Answers, categories: &[String]) -> Self {
        let mut answers = stored.clone();
        for category in categories {
            answers.entry(category.clone()).or_default();
        }
        Self::new(answers)
    }

    /// All answers
    #[inline]
    #[must_use]
    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// Consume into answers
    #[inline]
    #[must_use]
    pub fn into_answers(self) -> Answers {
        self.answers
    }

    /// One category's answer
    #[inline]
    #[must_use]
    pub fn category(&self, category: &str) -> Option<&CategoryAnswer> {
        self.answers.get(category)
    }

    /// Set the unit count of a category
    ///
    /// Returns `Ok(false)` for an unknown category.
    ///
    /// # Errors
    /// `OutOfRange` when `count` exceeds the unit cap; nothing changes.
    pub fn set_count(&mut self, category: &str, count: usize) -> Result<bool, ValidationError> {
        check_unit_count(count, self.max_units)?;
        match self.answers.get_mut(category) {
            Some(answer) => {
                answer.set_count(count)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replace one field of one unit
    ///
    /// # Errors
    /// Shape or range violations of the value.
    pub fn set_detail_field(
        &mut self,
        category: &str,
        index: usize,
        field: DetailField,
        value: DetailValue,
    ) -> Result<bool, ValidationError> {
        match self.answers.get_mut(category) {
            Some(answer) => answer.set_detail_field(index, field, value),
            None => Ok(false),
        }
    }

    /// Delete one unit, shifting the rest left
    pub fn remove_unit(&mut self, category: &str, index: usize) -> Option<UnitDetail> {
        self.answers
            .get_mut(category)
            .and_then(|answer| answer.remove_unit(index))
    }

    /// Categories with at least one declared unit
    #[must_use]
    pub fn answered_categories(&self) -> Vec<&str> {
        self.answers
            .iter()
            .filter(|(_, a)| a.is_answered())
            .map(|(c, _)| c.as_str())
            .collect()
    }

    /// Answered vs. total
    #[must_use]
    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answers.values().filter(|a| a.is_answered()).count(),
            total: self.answers.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn cats(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn reconcile_synthesizes_missing_and_keeps_stale() {
        let mut stored = Answers::new();
        stored.insert("Legacy".to_string(), CategoryAnswer::with_count(2).unwrap());
        stored.insert("Redes".to_string(), CategoryAnswer::with_count(1).unwrap());

        let draft = AuditDraft::reconcile(&stored, &cats(&["Redes", "Servidores"]));
        assert_eq!(draft.answers().len(), 3);
        assert_eq!(draft.category("Legacy").map(CategoryAnswer::count), Some(2));
        assert_eq!(draft.category("Redes").map(CategoryAnswer::count), Some(1));
        assert_eq!(draft.category("Servidores"), Some(&CategoryAnswer::new()));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let stored = Answers::new();
        let categories = cats(&["A", "B"]);
        let once = AuditDraft::reconcile(&stored, &categories);
        let twice = AuditDraft::reconcile(once.answers(), &categories);
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_category_edits_are_noops() {
        let mut draft = AuditDraft::reconcile(&Answers::new(), &cats(&["A"]));
        let before = draft.clone();
        assert!(!draft.set_count("Z", 3).unwrap());
        assert!(!draft.set_detail_field("Z", 0, DetailField::Name, "x".into()).unwrap());
        assert!(draft.remove_unit("Z", 0).is_none());
        assert_eq!(draft, before);
    }

    #[test]
    fn progress_counts_answered() {
        let mut draft = AuditDraft::reconcile(&Answers::new(), &cats(&["A", "B", "C"]));
        draft.set_count("B", 2).unwrap();
        assert_eq!(draft.answered_categories(), vec!["B"]);
        assert_eq!(draft.progress(), Progress { answered: 1, total: 3 });
    }

    #[test]
    fn count_above_cap_is_rejected_without_change() {
        let mut draft = AuditDraft::reconcile(&Answers::new(), &cats(&["A"])).with_max_units(3);
        assert!(draft.set_count("A", 3).unwrap());
        let before = draft.clone();
        let err = draft.set_count("A", 4).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { max: 3, value: 4, .. }));
        assert!(draft.set_count("A", usize::MAX).is_err());
        assert_eq!(draft, before);
    }

    #[test]
    fn cap_never_exceeds_model_ceiling() {
        let draft = AuditDraft::default().with_max_units(usize::MAX);
        assert_eq!(draft.max_units(), CategoryAnswer::MAX_UNITS);
    }

    proptest! {
        #[test]
        fn prop_reconcile_covers_every_category(names in proptest::collection::vec("[a-z]{1,6}", 0..10)) {
            let draft = AuditDraft::reconcile(&Answers::new(), &names);
            for name in &names {
                prop_assert!(draft.category(name).is_some());
            }
            let again = AuditDraft::reconcile(draft.answers(), &names);
            prop_assert_eq!(again, draft);
        }
    }
}
