use super::{Expense, Member, ShareMapping, ValidationError, share_sum};

/// Editable copy of a share mapping. Not validated until committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareDraft {
    members: Vec<Member>,
}

impl ShareDraft {
    fn from_mapping(mapping: &ShareMapping) -> Self {
        Self {
            members: mapping.members().to_vec(),
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn sum(&self) -> f64 {
        share_sum(&self.members)
    }

    /// Set a member's share, adding the member at the end if absent.
    pub fn set_share(&mut self, name: &str, share: f64) {
        let name = name.trim();
        match self.members.iter_mut().find(|m| m.name == name) {
            Some(member) => member.share = share,
            None => self.members.push(Member::new(name, share)),
        }
    }

    /// Returns false if the member was not in the draft.
    pub fn remove_member(&mut self, name: &str) -> bool {
        let name = name.trim();
        let before = self.members.len();
        self.members.retain(|m| m.name != name);
        self.members.len() != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Viewing,
    Editing,
}

/// Holds the active share mapping and, while editing, a draft that replaces it on commit.
#[derive(Debug, Clone)]
pub struct ShareEditor {
    active: ShareMapping,
    draft: Option<ShareDraft>,
}

impl ShareEditor {
    pub fn new(active: ShareMapping) -> Self {
        Self {
            active,
            draft: None,
        }
    }

    pub fn active(&self) -> &ShareMapping {
        &self.active
    }

    pub fn state(&self) -> EditorState {
        match self.draft {
            Some(_) => EditorState::Editing,
            None => EditorState::Viewing,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&ShareDraft> {
        self.draft.as_ref()
    }

    /// Start editing from a copy of the active mapping.
    /// If an edit is already in progress its draft is kept.
    pub fn begin(&mut self) -> &mut ShareDraft {
        let active = &self.active;
        self.draft
            .get_or_insert_with(|| ShareDraft::from_mapping(active))
    }

    pub fn draft_mut(&mut self) -> Result<&mut ShareDraft, ValidationError> {
        self.draft.as_mut().ok_or(ValidationError::NotEditing)
    }

    /// Validate the draft and make it the active mapping.
    ///
    /// `expenses` are the currently recorded expenses: a draft that drops a member who
    /// paid for any of them is rejected. On error the editor stays in `Editing` with the
    /// draft untouched.
    pub fn commit(&mut self, expenses: &[Expense]) -> Result<&ShareMapping, ValidationError> {
        let draft = self.draft.as_ref().ok_or(ValidationError::NotEditing)?;

        for member in self.active.members() {
            if draft.members.iter().any(|m| m.name == member.name) {
                continue;
            }
            let count = expenses.iter().filter(|e| e.paid_by == member.name).count();
            if count > 0 {
                return Err(ValidationError::MemberHasExpenses {
                    member: member.name.clone(),
                    count,
                });
            }
        }

        self.active = ShareMapping::new(draft.members.clone())?;
        self.draft = None;
        Ok(&self.active)
    }

    /// Drop the draft. The active mapping is unchanged.
    pub fn cancel(&mut self) {
        self.draft = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewExpense;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn paid_by(name: &str) -> Expense {
        NewExpense::new("x", 1000, name, NaiveDate::from_ymd_opt(2024, 2, 2).unwrap())
            .into_expense(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_commit_valid_draft() {
        let mut editor = ShareEditor::new(ShareMapping::default_group());
        let draft = editor.begin();
        draft.set_share("Alice", 0.2);
        draft.set_share("Carol", 0.5);

        let committed = editor.commit(&[]).unwrap().clone();
        assert_eq!(committed.share_of("Alice"), Some(0.2));
        assert_eq!(committed.share_of("Carol"), Some(0.5));
        assert_eq!(editor.active(), &committed);
        assert_eq!(editor.state(), EditorState::Viewing);
    }

    #[test]
    fn test_commit_rejects_bad_sum_and_stays_editing() {
        let original = ShareMapping::default_group();
        let mut editor = ShareEditor::new(original.clone());
        editor.begin().set_share("Alice", 0.5);

        let err = editor.commit(&[]).unwrap_err();
        assert!(matches!(err, ValidationError::ShareSumMismatch { .. }));
        assert!(editor.is_editing());
        assert_eq!(editor.active(), &original);

        // Fixing the draft lets the same edit go through.
        editor.draft_mut().unwrap().set_share("Bob", 0.1);
        assert!(editor.commit(&[]).is_ok());
    }

    #[test]
    fn test_cancel_discards_draft() {
        let original = ShareMapping::default_group();
        let mut editor = ShareEditor::new(original.clone());
        editor.begin().set_share("Bob", 0.9);
        editor.cancel();

        assert!(!editor.is_editing());
        assert_eq!(editor.active(), &original);
        // A fresh edit starts from the active mapping again.
        assert_eq!(editor.begin().members(), original.members());
    }

    #[test]
    fn test_begin_twice_keeps_draft() {
        let mut editor = ShareEditor::new(ShareMapping::default_group());
        editor.begin().set_share("Alice", 0.1);
        assert_eq!(editor.begin().members()[0].share, 0.1);
    }

    #[test]
    fn test_commit_without_edit() {
        let mut editor = ShareEditor::new(ShareMapping::default_group());
        assert_eq!(editor.commit(&[]).unwrap_err(), ValidationError::NotEditing);
        assert!(editor.draft_mut().is_err());
    }

    #[test]
    fn test_add_and_remove_members() {
        let mut editor = ShareEditor::new(ShareMapping::default_group());
        let draft = editor.begin();
        assert!(draft.remove_member(" Carol"));
        assert!(!draft.remove_member("Carol"));
        draft.set_share("Dave ", 0.4);
        draft.set_share(" Bob", 0.3);
        assert_eq!(draft.members().len(), 3);
        assert!((draft.sum() - 1.0).abs() < 1e-9);

        let committed = editor.commit(&[paid_by("Alice")]).unwrap();
        assert_eq!(committed.names().collect::<Vec<_>>(), ["Alice", "Bob", "Dave"]);
    }

    #[test]
    fn test_cannot_remove_member_with_expenses() {
        let mut editor = ShareEditor::new(ShareMapping::default_group());
        let draft = editor.begin();
        draft.remove_member("Carol");
        draft.set_share("Alice", 0.7);

        let expenses = vec![paid_by("Carol"), paid_by("Carol"), paid_by("Bob")];
        assert_eq!(
            editor.commit(&expenses).unwrap_err(),
            ValidationError::MemberHasExpenses {
                member: "Carol".into(),
                count: 2
            }
        );
        assert!(editor.is_editing());
        assert!(editor.active().contains("Carol"));
    }
}
