// Cause category value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CauseCategory {
    FoodSecurity,
    AnimalWelfare,
    Environment,
    Education,
    Health,
    Community,
    Other,
}

impl CauseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CauseCategory::FoodSecurity => "food_security",
            CauseCategory::AnimalWelfare => "animal_welfare",
            CauseCategory::Environment => "environment",
            CauseCategory::Education => "education",
            CauseCategory::Health => "health",
            CauseCategory::Community => "community",
            CauseCategory::Other => "other",
        }
    }
}

impl fmt::Display for CauseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CauseCategory {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "food_security" => CauseCategory::FoodSecurity,
            "animal_welfare" => CauseCategory::AnimalWelfare,
            "environment" => CauseCategory::Environment,
            "education" => CauseCategory::Education,
            "health" => CauseCategory::Health,
            "community" => CauseCategory::Community,
            _ => CauseCategory::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loosely_formatted_names() {
        assert_eq!(CauseCategory::from("Food Security"), CauseCategory::FoodSecurity);
        assert_eq!(CauseCategory::from("animal-welfare"), CauseCategory::AnimalWelfare);
        assert_eq!(CauseCategory::from(" HEALTH "), CauseCategory::Health);
    }

    #[test]
    fn unknown_names_fall_back_to_other() {
        assert_eq!(CauseCategory::from("space exploration"), CauseCategory::Other);
        assert_eq!(CauseCategory::from(""), CauseCategory::Other);
    }
}
