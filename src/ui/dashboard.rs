use std::rc::Rc;

use crate::backend::{DocumentStore, LiveQuery};
use crate::models::Budget;
use crate::session::SessionState;

use super::budget_form::{BudgetForm, SubmitOutcome};
use super::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Navigation {
    Stay,
    ToLogin,
}

/// The budgets subscription for one identity. `live` is `None` when the
/// store refused the query; the failure is not retried for that identity.
struct BudgetWatch {
    uid: String,
    live: Option<LiveQuery>,
    loaded: bool,
}

pub(crate) struct DashboardView {
    store: Rc<dyn DocumentStore>,
    watch: Option<BudgetWatch>,
    budgets: Vec<Budget>,
    pub(crate) form: BudgetForm,
    pub(crate) index: usize,
    pub(crate) scroll: usize,
}

impl DashboardView {
    pub(crate) fn new(store: Rc<dyn DocumentStore>) -> Self {
        Self {
            store,
            watch: None,
            budgets: Vec::new(),
            form: BudgetForm::new(),
            index: 0,
            scroll: 0,
        }
    }

    pub(crate) fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    /// Follow the session: release the subscription when the identity goes
    /// away or changes, then open one for the new identity.
    pub(crate) fn sync_session(&mut self, session: &SessionState) -> Navigation {
        match session {
            SessionState::Loading => Navigation::Stay,
            SessionState::SignedOut => {
                self.release();
                Navigation::ToLogin
            }
            SessionState::SignedIn { user, .. } => {
                let current = self.watch.as_ref().map(|w| w.uid.as_str());
                if current != Some(user.uid.as_str()) {
                    self.release();
                    self.acquire(&user.uid);
                }
                Navigation::Stay
            }
        }
    }

    fn acquire(&mut self, uid: &str) {
        let live = match self.store.watch(Budget::visible_to(uid)) {
            Ok(live) => {
                tracing::debug!(uid, "budgets subscription opened");
                Some(live)
            }
            Err(e) => {
                tracing::warn!(uid, error = %e, "budgets subscription failed");
                None
            }
        };
        self.watch = Some(BudgetWatch {
            uid: uid.to_string(),
            live,
            loaded: false,
        });
    }

    fn release(&mut self) {
        if let Some(watch) = self.watch.take() {
            tracing::debug!(uid = %watch.uid, "budgets subscription released");
        }
        self.budgets.clear();
        scroll_to_top(&mut self.index, &mut self.scroll);
    }

    /// Replace the list with the newest snapshot, if one arrived.
    pub(crate) fn pump(&mut self) -> bool {
        let Some(watch) = self.watch.as_mut() else {
            return false;
        };
        let Some(snapshot) = watch.live.as_ref().and_then(LiveQuery::latest) else {
            return false;
        };

        watch.loaded = true;
        self.budgets = snapshot
            .iter()
            .filter_map(|doc| match Budget::from_document(doc) {
                Ok(budget) => Some(budget),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable budget");
                    None
                }
            })
            .collect();

        if self.index >= self.budgets.len() {
            self.index = self.budgets.len().saturating_sub(1);
            self.scroll = self.scroll.min(self.index);
        }
        true
    }

    /// Loading while the session or the first snapshot is pending.
    pub(crate) fn is_loading(&self, session: &SessionState) -> bool {
        match session {
            SessionState::SignedIn { .. } => !self.watch.as_ref().is_some_and(|w| w.loaded),
            _ => session.is_loading(),
        }
    }

    pub(crate) fn submit_form(&mut self, session: &SessionState) -> SubmitOutcome {
        let outcome = self.form.submit(session, &*self.store);
        if let SubmitOutcome::Created(id) = &outcome {
            self.on_budget_added(id);
        }
        outcome
    }

    /// The live query already carries the new record; nothing to refetch.
    fn on_budget_added(&self, id: &str) {
        tracing::info!(id, "budget added");
    }

    pub(crate) fn move_down(&mut self, page: usize) {
        scroll_down(&mut self.index, &mut self.scroll, self.budgets.len(), page);
    }

    pub(crate) fn move_up(&mut self) {
        scroll_up(&mut self.index, &mut self.scroll);
    }

    pub(crate) fn goto_top(&mut self) {
        scroll_to_top(&mut self.index, &mut self.scroll);
    }

    pub(crate) fn goto_bottom(&mut self, page: usize) {
        scroll_to_bottom(&mut self.index, &mut self.scroll, self.budgets.len(), page);
    }
}
