use chrono::Utc;

/// Hands out entity ids derived from the current time in milliseconds.
///
/// Two calls within the same millisecond (or a clock that steps backwards)
/// would collide on a raw timestamp, so each id is `max(now, last + 1)`.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        IdGenerator::default()
    }

    /// Start after `max_existing` so ids from a loaded catalog are never reused.
    pub fn seeded(max_existing: i64) -> Self {
        IdGenerator { last: max_existing }
    }

    /// Raise the floor without handing out an id.
    pub fn observe(&mut self, id: i64) {
        self.last = self.last.max(id);
    }

    /// The most recent id handed out or observed
    pub fn last(&self) -> i64 {
        self.last
    }

    pub fn next(&mut self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: i64) -> i64 {
        let id = now_millis.max(self.last + 1);
        self.last = id;
        id
    }
}
