//! Serde helpers for partial updates.
//!
//! Nullable columns use `Option<Option<T>>` in change structs:
//! a missing key leaves the column alone, `null` clears it and a value sets it.

use serde::{Deserialize, Deserializer};

/// Use with `#[serde(default, deserialize_with = "crate::patch::nullable")]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Changes {
        #[serde(default, deserialize_with = "super::nullable")]
        phone: Option<Option<String>>,
    }

    #[test]
    fn test_missing_null_and_value_are_distinct() {
        let missing: Changes = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.phone, None);

        let cleared: Changes = serde_json::from_str(r#"{"phone": null}"#).unwrap();
        assert_eq!(cleared.phone, Some(None));

        let set: Changes = serde_json::from_str(r#"{"phone": "555-0100"}"#).unwrap();
        assert_eq!(set.phone, Some(Some("555-0100".to_string())));
    }
}
