/// Server tracked conversation. Issued once at startup and handed to the
/// orchestrator, it is never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub id: String,
}

impl Session {
    pub fn new(id: &str) -> Session {
        return Session { id: id.to_string() };
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum ListOrder {
    #[strum(serialize = "asc")]
    Ascending,
    #[strum(serialize = "desc")]
    Descending,
}
