use serde::{Deserialize, Serialize};

/// A student row as served by the public share endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Unique within a result set; used as the display key.
    pub roll_no: String,
}

impl StudentRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
