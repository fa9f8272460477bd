use serde::de::{self, Deserializer, Visitor};
use std::fmt;

/// 生成带前缀的唯一 ID（如 `dev_3f2a...`）
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// 反序列化 ID：接受字符串或整数，统一保存为字符串
///
/// 旧数据以毫秒时间戳作为数字 ID（如 `1700000000000`）
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IdVisitor)
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        if v.fract() == 0.0 && v.is_finite() {
            Ok(format!("{:.0}", v))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Record {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
    }

    fn parse(json: &str) -> serde_json::Result<String> {
        serde_json::from_str::<Record>(json).map(|r| r.id)
    }

    #[test]
    fn test_numeric_and_string_ids() {
        assert_eq!(parse(r#"{"id":1700000000000}"#).unwrap(), "1700000000000");
        assert_eq!(parse(r#"{"id":"dev_abc"}"#).unwrap(), "dev_abc");
        assert_eq!(parse(r#"{"id":1700000000000.0}"#).unwrap(), "1700000000000");
        assert!(parse(r#"{"id":1.5}"#).is_err());
        assert!(parse(r#"{"id":true}"#).is_err());
    }
}
