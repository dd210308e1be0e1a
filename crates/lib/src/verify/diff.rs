//! Field-by-field differences between two serializable values.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
  /// Dotted field path, e.g. `Parameters.GoVersion`.
  pub path: String,
  pub primary: Value,
  pub verification: Value,
}

impl fmt::Display for Difference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {} != {}", self.path, self.primary, self.verification)
  }
}

/// Every leaf where `a` and `b` serialize differently. Empty when equal.
pub fn diff<T: Serialize>(root: &str, a: &T, b: &T) -> Vec<Difference> {
  let (a, b) = match (serde_json::to_value(a), serde_json::to_value(b)) {
    (Ok(a), Ok(b)) => (a, b),
    (a, b) => (
      a.unwrap_or_else(|e| Value::String(e.to_string())),
      b.unwrap_or_else(|e| Value::String(e.to_string())),
    ),
  };
  let mut out = Vec::new();
  walk(root, &a, &b, &mut out);
  out
}

fn walk(path: &str, a: &Value, b: &Value, out: &mut Vec<Difference>) {
  match (a, b) {
    (Value::Object(left), Value::Object(right)) => {
      let mut keys: Vec<&String> = left.keys().chain(right.keys()).collect();
      keys.sort();
      keys.dedup();
      for key in keys {
        let child = if path.is_empty() {
          key.clone()
        } else {
          format!("{}.{}", path, key)
        };
        walk(
          &child,
          left.get(key).unwrap_or(&Value::Null),
          right.get(key).unwrap_or(&Value::Null),
          out,
        );
      }
    }
    _ if a != b => out.push(Difference {
      path: path.to_string(),
      primary: a.clone(),
      verification: b.clone(),
    }),
    _ => {}
  }
}

/// One difference per line.
pub fn render(diffs: &[Difference]) -> String {
  diffs.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::lockbox_parameters;

  #[test]
  fn equal_values_have_no_diff() {
    let p = lockbox_parameters("true");
    assert!(diff("Parameters", &p, &p.clone()).is_empty());
  }

  #[test]
  fn changed_leaf_is_reported_with_path() {
    let a = lockbox_parameters("true");
    let b = crate::config::Parameters {
      go_version: "1.19".to_string(),
      ..a.clone()
    };

    let diffs = diff("Parameters", &a, &b);
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].path, "Parameters.GoVersion");
    assert_eq!(render(&diffs), "Parameters.GoVersion: \"1.18\" != \"1.19\"");
  }

  #[test]
  fn nested_objects_are_walked() {
    let a = serde_json::json!({"Version": {"Full": "1.2.3", "Core": "1.2.3"}});
    let b = serde_json::json!({"Version": {"Full": "1.2.4", "Core": "1.2.3"}, "Extra": 1});
    let paths: Vec<_> = diff("", &a, &b).into_iter().map(|d| d.path).collect();
    assert_eq!(paths, vec!["Extra", "Version.Full"]);
  }
}
