use serde::{de::DeserializeOwned, Serialize};
use std::hash::Hash;

/// Трейт для типов идентификаторов агрегатов
pub trait AggregateId:
    Clone + PartialEq + Eq + Hash + Serialize + DeserializeOwned + std::fmt::Debug
{
    /// Преобразовать ID в строку
    fn as_string(&self) -> String;

    /// Создать ID из строки
    fn from_string(s: &str) -> Result<Self, String>;
}

impl AggregateId for i64 {
    fn as_string(&self) -> String {
        ToString::to_string(self)
    }

    fn from_string(s: &str) -> Result<Self, String> {
        s.trim()
            .parse::<i64>()
            .map_err(|e| format!("Invalid i64: {}", e))
    }
}

impl AggregateId for uuid::Uuid {
    fn as_string(&self) -> String {
        ToString::to_string(self)
    }

    fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim()).map_err(|e| format!("Invalid UUID: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_round_trips_through_string() {
        let id = uuid::Uuid::new_v4();
        let parsed = <uuid::Uuid as AggregateId>::from_string(&id.as_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(<uuid::Uuid as AggregateId>::from_string("not-a-uuid").is_err());
        assert!(<i64 as AggregateId>::from_string("12a").is_err());
        assert_eq!(<i64 as AggregateId>::from_string(" 42 ").unwrap(), 42);
    }
}
