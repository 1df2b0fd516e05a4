use tracing::warn;

use crate::domain::{
    Expense, ExpenseFilter, ExpenseId, NewExpense, Settlement, ShareDraft, ShareEditor,
    ShareMapping, SortKey, arrange, compute_settlement,
};

use super::{AppError, ExpenseService};

/// What a client sees: the last fetched expenses, the share editor, and the
/// current filter and sort choice.
///
/// Every mutation is followed by a full re-fetch, so balances are never derived from
/// a list older than the mutation just made. When a store call fails the previously
/// loaded state is kept as it was. A mutation that was stored but could not be
/// re-fetched still succeeds; the list is then marked stale until the next refresh.
pub struct GroupSession {
    service: ExpenseService,
    expenses: Vec<Expense>,
    stale: bool,
    editor: ShareEditor,
    filter: ExpenseFilter,
    sort: SortKey,
}

impl GroupSession {
    /// Fetch expenses and the share mapping from the store.
    pub async fn load(service: ExpenseService) -> Result<Self, AppError> {
        let shares = service.shares().await?;
        let expenses = service.list_expenses().await?;
        Ok(Self {
            service,
            expenses,
            stale: false,
            editor: ShareEditor::new(shares),
            filter: ExpenseFilter::all(),
            sort: SortKey::default(),
        })
    }

    pub fn service(&self) -> &ExpenseService {
        &self.service
    }

    /// Expenses in store order (newest expense date first).
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn shares(&self) -> &ShareMapping {
        self.editor.active()
    }

    pub fn editor(&self) -> &ShareEditor {
        &self.editor
    }

    /// True when the store changed but the list could not be re-fetched afterwards.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Re-fetch the expense list.
    pub async fn refresh(&mut self) -> Result<(), AppError> {
        match self.service.list_expenses().await {
            Ok(expenses) => {
                self.expenses = expenses;
                self.stale = false;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to refresh expenses, keeping previous list");
                Err(err)
            }
        }
    }

    /// Store a new expense. Once the insert succeeds the created record is returned,
    /// even if the follow-up re-fetch fails.
    pub async fn add_expense(&mut self, new_expense: NewExpense) -> Result<Expense, AppError> {
        let expense = self
            .service
            .add_expense(new_expense)
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to add expense"))?;
        self.refresh_after_mutation().await;
        Ok(expense)
    }

    pub async fn delete_expense(&mut self, id: ExpenseId) -> Result<(), AppError> {
        self.service
            .delete_expense(id)
            .await
            .inspect_err(|err| warn!(error = %err, "Failed to delete expense"))?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    async fn refresh_after_mutation(&mut self) {
        if self.refresh().await.is_err() {
            self.stale = true;
        }
    }

    // ========================
    // Derived views
    // ========================

    pub fn settlement(&self) -> Settlement {
        let settlement = compute_settlement(&self.expenses, self.editor.active());
        if !settlement.is_consistent() {
            warn!(
                count = settlement.orphaned.len(),
                "Some expenses were paid by non-members, their credit is not counted"
            );
        }
        settlement
    }

    pub fn filter(&self) -> &ExpenseFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ExpenseFilter) {
        self.filter = filter;
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    /// Expenses after the current filter and sort.
    pub fn view(&self) -> Vec<&Expense> {
        arrange(&self.expenses, &self.filter, self.sort)
    }

    /// Pick expenses by id, in current view order. Ids hidden by the filter are still
    /// selectable. An empty `ids` yields an empty selection.
    pub fn select(&self, ids: &[ExpenseId]) -> Result<Vec<&Expense>, AppError> {
        if let Some(missing) = ids.iter().find(|id| !self.expenses.iter().any(|e| e.id == **id)) {
            return Err(AppError::ExpenseNotFound(missing.to_string()));
        }
        Ok(arrange(&self.expenses, &ExpenseFilter::all(), self.sort)
            .into_iter()
            .filter(|e| ids.contains(&e.id))
            .collect())
    }

    // ========================
    // Share editing
    // ========================

    pub fn begin_share_edit(&mut self) -> &mut ShareDraft {
        self.editor.begin()
    }

    pub fn share_draft_mut(&mut self) -> Result<&mut ShareDraft, AppError> {
        Ok(self.editor.draft_mut()?)
    }

    /// Validate and persist the draft. On any failure the draft is kept for another try.
    pub async fn commit_share_edit(&mut self) -> Result<&ShareMapping, AppError> {
        let mut next = self.editor.clone();
        let mapping = next.commit(&self.expenses)?.clone();
        self.service.save_shares(&mapping).await?;
        self.editor = next;
        Ok(self.editor.active())
    }

    pub fn cancel_share_edit(&mut self) {
        self.editor.cancel();
    }
}
