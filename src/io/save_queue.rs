/// Serializes saves so the newest mutation always wins.
///
/// Documents are submitted tagged with the store revision that produced
/// them. Only the newest pending one is kept; `flush` writes it and
/// records its revision as saved. A failed flush keeps the document
/// pending until a newer submission replaces it.
#[derive(Debug)]
pub struct SaveQueue<T> {
    pending: Option<(u64, T)>,
    last_saved: Option<u64>,
}

impl<T> Default for SaveQueue<T> {
    fn default() -> Self {
        SaveQueue {
            pending: None,
            last_saved: None,
        }
    }
}

impl<T> SaveQueue<T> {
    pub fn new() -> Self {
        SaveQueue::default()
    }

    /// Returns false when the submission is stale and was dropped.
    pub fn submit(&mut self, revision: u64, document: T) -> bool {
        if self.last_saved.is_some_and(|saved| revision <= saved) {
            return false;
        }
        if let Some((pending, _)) = &self.pending
            && revision <= *pending
        {
            return false;
        }
        self.pending = Some((revision, document));
        true
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_saved(&self) -> Option<u64> {
        self.last_saved
    }

    /// Write the pending document, if any. Returns the revision written.
    pub fn flush<E>(&mut self, mut write: impl FnMut(&T) -> Result<(), E>) -> Result<Option<u64>, E> {
        let Some((revision, document)) = self.pending.take() else {
            return Ok(None);
        };
        match write(&document) {
            Ok(()) => {
                self.last_saved = Some(revision);
                Ok(Some(revision))
            }
            Err(e) => {
                self.pending = Some((revision, document));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_submission_wins() {
        let mut q = SaveQueue::new();
        assert!(q.submit(1, "a"));
        assert!(q.submit(3, "c"));
        assert!(!q.submit(2, "b"));
        let mut written = Vec::new();
        let rev = q
            .flush(|doc| {
                written.push(*doc);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert_eq!(rev, Some(3));
        assert_eq!(written, vec!["c"]);
        assert!(!q.has_pending());
    }

    #[test]
    fn stale_after_save_is_dropped() {
        let mut q = SaveQueue::new();
        q.submit(5, "x");
        q.flush(|_| Ok::<(), ()>(())).unwrap();
        assert!(!q.submit(5, "x again"));
        assert!(!q.submit(4, "older"));
        assert!(q.submit(6, "newer"));
    }

    #[test]
    fn failed_flush_stays_pending() {
        let mut q = SaveQueue::new();
        q.submit(1, "a");
        assert_eq!(q.flush(|_| Err("disk full")), Err("disk full"));
        assert!(q.has_pending());
        assert_eq!(q.last_saved(), None);
        assert_eq!(q.flush(|_| Ok::<(), &str>(())), Ok(Some(1)));
    }

    #[test]
    fn empty_flush_writes_nothing() {
        let mut q: SaveQueue<&str> = SaveQueue::new();
        let mut calls = 0;
        q.flush(|_| {
            calls += 1;
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(calls, 0);
    }
}
