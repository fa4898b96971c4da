use serde::{Deserialize, Serialize};

/// Camera model. Reference data: created by seeding, never mutated by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Camera {
    pub id: i32,
    pub name: String,
    pub location: String,
}

/// Camera fields needed to insert a new camera
#[derive(Debug, Clone)]
pub struct NewCamera {
    pub name: String,
    pub location: String,
}

impl NewCamera {
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}
