//! Positional argument lists.
//!
//! Outbound command messages carry their arguments as a JSON array in the
//! payload. `ArgList` gives typed, positional access to them.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DispatchError;

/// The positional arguments of one command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgList {
    args: Vec<Value>,
}

impl ArgList {
    pub fn new(args: Vec<Value>) -> Self {
        Self { args }
    }

    /// Interpret a message payload as arguments.
    ///
    /// An array is the argument list itself, `null` is no arguments, and any
    /// other value is a single argument.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Array(args) => Self { args },
            Value::Null => Self::default(),
            other => Self { args: vec![other] },
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }

    /// Decode the argument at `index`, failing if it is absent or `null`.
    pub fn required<T: DeserializeOwned>(
        &self,
        command: &'static str,
        index: usize,
    ) -> Result<T, DispatchError> {
        match self.args.get(index) {
            None | Some(Value::Null) => Err(DispatchError::MissingArgument { command, index }),
            Some(value) => decode(command, index, value),
        }
    }

    /// Decode the argument at `index`; absent and `null` both give `None`.
    pub fn optional<T: DeserializeOwned>(
        &self,
        command: &'static str,
        index: usize,
    ) -> Result<Option<T>, DispatchError> {
        match self.args.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(command, index, value).map(Some),
        }
    }

    /// Decode a value that may be given either alone or as an array.
    pub fn one_or_many<T: DeserializeOwned>(
        &self,
        command: &'static str,
        index: usize,
    ) -> Result<Vec<T>, DispatchError> {
        match self.args.get(index) {
            None | Some(Value::Null) => Err(DispatchError::MissingArgument { command, index }),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| decode(command, index, item))
                .collect(),
            Some(value) => decode(command, index, value).map(|one| vec![one]),
        }
    }

    /// Split off an optional leading integer id.
    ///
    /// Several host calls take an optional target id before their other
    /// arguments. When the first argument is an integer it is returned and
    /// the remaining arguments shift left by one.
    pub fn leading_id(self) -> (Option<i64>, ArgList) {
        match self.args.first().and_then(Value::as_i64) {
            Some(id) => (Some(id), Self { args: self.args[1..].to_vec() }),
            None => (None, self),
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.args
    }
}

fn decode<T: DeserializeOwned>(
    command: &'static str,
    index: usize,
    value: &Value,
) -> Result<T, DispatchError> {
    T::deserialize(value).map_err(|e| DispatchError::InvalidArgument {
        command,
        index,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_payload_is_the_list() {
        let args = ArgList::from_payload(json!([1, "two"]));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_null_payload_is_empty() {
        assert!(ArgList::from_payload(Value::Null).is_empty());
    }

    #[test]
    fn test_scalar_payload_is_single_argument() {
        let args = ArgList::from_payload(json!({"url": "about:blank"}));
        assert_eq!(args.len(), 1);
        assert_eq!(args.get(0), Some(&json!({"url": "about:blank"})));
    }

    #[test]
    fn test_required_missing() {
        let args = ArgList::from_payload(json!([null]));
        let result: Result<i64, _> = args.required("remove", 0);
        assert_eq!(
            result,
            Err(DispatchError::MissingArgument {
                command: "remove",
                index: 0
            })
        );
    }

    #[test]
    fn test_required_wrong_type() {
        let args = ArgList::from_payload(json!(["seven"]));
        let result: Result<i64, _> = args.required("remove", 0);
        assert!(matches!(
            result,
            Err(DispatchError::InvalidArgument { index: 0, .. })
        ));
    }

    #[test]
    fn test_optional() {
        let args = ArgList::from_payload(json!([5]));
        assert_eq!(args.optional::<i64>("reload", 0).unwrap(), Some(5));
        assert_eq!(args.optional::<i64>("reload", 1).unwrap(), None);
    }

    #[test]
    fn test_one_or_many() {
        let single = ArgList::from_payload(json!([3]));
        let many = ArgList::from_payload(json!([[3, 4]]));
        assert_eq!(single.one_or_many::<i64>("remove", 0).unwrap(), vec![3]);
        assert_eq!(many.one_or_many::<i64>("remove", 0).unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_leading_id() {
        let (id, rest) = ArgList::from_payload(json!([9, {"active": true}])).leading_id();
        assert_eq!(id, Some(9));
        assert_eq!(rest.get(0), Some(&json!({"active": true})));

        let (id, rest) = ArgList::from_payload(json!([{"active": true}])).leading_id();
        assert_eq!(id, None);
        assert_eq!(rest.len(), 1);
    }
}
