use serde::{Serialize, Deserialize};

use crate::utils::normalizations::normalize_title;

use super::ValidationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    id: i64,
    name: String,
}

impl PartialEq for Genre {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Genre {}

impl Genre {
    pub fn new<S: Into<String>>(id: i64, name: S) -> Result<Self, ValidationError> {
        let name = normalize_title(&name.into());
        if name.is_empty() {
            return Err(ValidationError::NameIsEmptyString);
        }
        Ok(Self { id, name })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
