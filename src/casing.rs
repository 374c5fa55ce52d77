//! Key casing conversion applied at the persistence boundary.
//!
//! Rows are converted to the insert casing right before they reach the record
//! store and the final hydrated structure is converted to the return casing
//! before it is handed back to the caller. Conversion is deep: keys of nested
//! objects and of objects inside arrays are converted too.

use std::str::FromStr;

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::config::ConfigError;

/// Key naming strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasingStrategy {
    /// `user_id` becomes `userId`.
    Camel,
    /// `userId` becomes `user_id`.
    Snake,
    /// Keys are left untouched.
    #[default]
    None,
}

impl CasingStrategy {
    /// Converts a single key.
    pub fn convert_key(self, key: &str) -> String {
        match self {
            Self::Camel => key.to_lower_camel_case(),
            Self::Snake => key.to_snake_case(),
            Self::None => key.to_string(),
        }
    }
}

impl FromStr for CasingStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "camel" => Ok(Self::Camel),
            "snake" => Ok(Self::Snake),
            "none" => Ok(Self::None),
            other => Err(ConfigError::InvalidCasing(other.to_string())),
        }
    }
}

/// Converts every key of a JSON structure with the given strategy.
///
/// Values are never touched, only object keys. Arrays are walked so a list of
/// hydrated relations gets the same treatment as its owner.
///
/// # Arguments
/// - `value` - Structure to convert
/// - `casing` - Strategy to apply
///
/// # Returns
/// - `Value` - Same shape with converted keys
pub fn convert_case(value: Value, casing: CasingStrategy) -> Value {
    if casing == CasingStrategy::None {
        return value;
    }

    match value {
        Value::Object(map) => Value::Object(convert_row(map, casing)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_case(item, casing))
                .collect(),
        ),
        other => other,
    }
}

/// Converts the keys of a single row.
pub fn convert_row(row: Map<String, Value>, casing: CasingStrategy) -> Map<String, Value> {
    if casing == CasingStrategy::None {
        return row;
    }

    row.into_iter()
        .map(|(key, value)| (casing.convert_key(&key), convert_case(value, casing)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn camelizes_nested_keys() {
        let value = json!({
            "user_id": 1,
            "account": { "admin_id": 2 },
            "posts": [{ "post_title": "a" }],
        });

        let converted = convert_case(value, CasingStrategy::Camel);

        assert_eq!(
            converted,
            json!({
                "userId": 1,
                "account": { "adminId": 2 },
                "posts": [{ "postTitle": "a" }],
            })
        );
    }

    #[test]
    fn leaves_values_untouched() {
        let value = json!({ "email": "first_name@ok.com" });

        let converted = convert_case(value.clone(), CasingStrategy::Camel);

        assert_eq!(converted, value);
    }

    #[test]
    fn snake_then_camel_round_trips_multi_word_keys() {
        for key in ["referral_code", "is_business_user", "onboarding_step", "user_id"] {
            let camel = CasingStrategy::Camel.convert_key(key);
            assert_eq!(CasingStrategy::Snake.convert_key(&camel), key);
        }
    }

    #[test]
    fn none_is_identity() {
        let value = json!({ "userId": 1, "user_id": 2 });

        assert_eq!(convert_case(value.clone(), CasingStrategy::None), value);
    }

    #[test]
    fn parses_strategy_names() {
        assert_eq!("camel".parse::<CasingStrategy>().unwrap(), CasingStrategy::Camel);
        assert_eq!(" Snake ".parse::<CasingStrategy>().unwrap(), CasingStrategy::Snake);
        assert!(matches!(
            "kebab".parse::<CasingStrategy>(),
            Err(ConfigError::InvalidCasing(name)) if name == "kebab"
        ));
    }
}
