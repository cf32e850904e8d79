use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct StatusId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct UserId {
    value: u64,
}

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct DirectMessageId {
    value: u64,
}

/// Yammer message, user and thread identifier
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct YammerId {
    value: u64,
}

impl StatusId {
    pub fn new(id: u64) -> Self {
        Self { value: id }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl UserId {
    pub fn new(id: u64) -> Self {
        Self { value: id }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl DirectMessageId {
    pub fn new(id: u64) -> Self {
        Self { value: id }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl YammerId {
    pub fn new(id: u64) -> Self {
        Self { value: id }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

/// Twitter sends ids as JSON numbers and, for clients that lose precision
/// above 2^53, as decimal strings (`id_str`). Both land here.
fn deserialize_numeric_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct NumericIdVisitor;

    impl<'de> Visitor<'de> for NumericIdVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer representing a numeric ID")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            value
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))
        }
    }

    deserializer.deserialize_any(NumericIdVisitor)
}

impl<'de> Deserialize<'de> for StatusId {
    fn deserialize<D>(deserializer: D) -> Result<StatusId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_numeric_id(deserializer).map(StatusId::new)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<UserId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_numeric_id(deserializer).map(UserId::new)
    }
}

impl<'de> Deserialize<'de> for DirectMessageId {
    fn deserialize<D>(deserializer: D) -> Result<DirectMessageId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_numeric_id(deserializer).map(DirectMessageId::new)
    }
}

impl<'de> Deserialize<'de> for YammerId {
    fn deserialize<D>(deserializer: D) -> Result<YammerId, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_numeric_id(deserializer).map(YammerId::new)
    }
}

impl Serialize for StatusId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value)
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value)
    }
}

impl Serialize for DirectMessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value)
    }
}

impl Serialize for YammerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value)
    }
}

impl std::fmt::Display for StatusId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for DirectMessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::fmt::Display for YammerId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_id_from_number_and_string() {
        let from_number: StatusId = serde_json::from_str("240859602684612608").unwrap();
        let from_string: StatusId = serde_json::from_str("\"240859602684612608\"").unwrap();

        assert_eq!(from_number, from_string);
        assert_eq!(from_number.value(), 240_859_602_684_612_608);
        assert_eq!(from_number.to_string(), "240859602684612608");
    }

    #[test]
    fn test_negative_id_rejected() {
        let result = serde_json::from_str::<UserId>("-5");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_string_rejected() {
        let result = serde_json::from_str::<StatusId>("\"abc\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_ids_order_numerically() {
        assert!(StatusId::new(9) < StatusId::new(10));
    }
}
