use indexmap::IndexSet;

/// What needs laying out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayoutRequest {
    /// One materialized row (and the rows below it, which re-flow).
    Row(usize),
    All,
}

/// A batch of requests being worked on. Hand it back to
/// [`LayoutScheduler::end_pass`] when done.
#[derive(Debug)]
pub struct LayoutPass {
    pub id: u64,
    pub requests: Vec<LayoutRequest>,
}

/// Coalesces layout requests into one pass per frame.
///
/// Requests made while a pass is running are not run recursively; they are
/// kept for the next pass.
#[derive(Debug, Default)]
pub struct LayoutScheduler {
    pending: IndexSet<LayoutRequest>,
    active: Option<u64>,
    passes: u64,
}

impl LayoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, request: LayoutRequest) {
        self.pending.insert(request);
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn in_pass(&self) -> bool {
        self.active.is_some()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Start a pass over everything requested so far. `None` when a pass is
    /// already running or nothing is pending.
    pub fn begin_pass(&mut self) -> Option<LayoutPass> {
        if let Some(id) = self.active {
            log::debug!("layout pass {id} still running; request deferred");
            return None;
        }
        if self.pending.is_empty() {
            return None;
        }
        let requests = if self.pending.contains(&LayoutRequest::All) {
            self.pending.clear();
            vec![LayoutRequest::All]
        } else {
            let mut rows: Vec<LayoutRequest> = self.pending.drain(..).collect();
            rows.sort_by_key(|r| match r {
                LayoutRequest::Row(i) => *i,
                LayoutRequest::All => 0,
            });
            rows
        };
        self.passes += 1;
        self.active = Some(self.passes);
        Some(LayoutPass {
            id: self.passes,
            requests,
        })
    }

    pub fn end_pass(&mut self, pass: LayoutPass) {
        debug_assert_eq!(self.active, Some(pass.id));
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce_into_one_pass() {
        let mut s = LayoutScheduler::new();
        s.request(LayoutRequest::Row(3));
        s.request(LayoutRequest::Row(1));
        s.request(LayoutRequest::Row(3));

        let pass = s.begin_pass().unwrap();
        assert_eq!(
            pass.requests,
            vec![LayoutRequest::Row(1), LayoutRequest::Row(3)]
        );
        s.end_pass(pass);
        assert!(s.begin_pass().is_none());
        assert_eq!(s.passes(), 1);
    }

    #[test]
    fn all_subsumes_rows() {
        let mut s = LayoutScheduler::new();
        s.request(LayoutRequest::Row(2));
        s.request(LayoutRequest::All);
        let pass = s.begin_pass().unwrap();
        assert_eq!(pass.requests, vec![LayoutRequest::All]);
    }

    #[test]
    fn requests_during_a_pass_wait_for_the_next() {
        let mut s = LayoutScheduler::new();
        s.request(LayoutRequest::Row(0));
        let pass = s.begin_pass().unwrap();

        s.request(LayoutRequest::Row(5));
        assert!(s.begin_pass().is_none());
        assert!(s.in_pass());
        s.end_pass(pass);

        let next = s.begin_pass().unwrap();
        assert_eq!(next.requests, vec![LayoutRequest::Row(5)]);
    }
}
