//! Item budget for paginated scans and queries.

/// Tracks how many items a paginated read may still return.
///
/// `limit` bounds the total across every page, not the size of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    limit: Option<usize>,
    collected: usize,
}

impl PageBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            collected: 0,
        }
    }

    /// Items to request in the next page, `None` when unbounded.
    pub fn next_page_limit(&self) -> Option<usize> {
        self.limit.map(|limit| limit.saturating_sub(self.collected))
    }

    /// Records a page and returns how many of its items fit the budget.
    pub fn accept(&mut self, page_len: usize) -> usize {
        let accepted = match self.next_page_limit() {
            Some(remaining) => page_len.min(remaining),
            None => page_len,
        };
        self.collected += accepted;
        accepted
    }

    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.collected >= limit)
    }

    pub fn collected(&self) -> usize {
        self.collected
    }
}

/// Pure function: Whether another page should be requested.
pub fn should_fetch_next<K>(cursor: Option<&K>, budget: &PageBudget) -> bool {
    cursor.is_some() && !budget.is_exhausted()
}
