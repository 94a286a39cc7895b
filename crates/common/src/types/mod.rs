use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

/// Envelope used by the `/api/method/*` endpoints: the payload is always
/// returned under a top-level `message` key.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message<T> {
    pub message: T,
}

impl<T> Message<T> {
    pub fn new(message: T) -> Self {
        Self { message }
    }
}
