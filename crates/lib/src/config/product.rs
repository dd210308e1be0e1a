//! Product identity: what is being built, at which version and revision.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::consts::ENTERPRISE_SUFFIX;

/// A product version split into its core and build-metadata parts.
///
/// After [`Version::init`], `full == core` when `meta` is empty and
/// `full == core + "+" + meta` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Version {
  pub full: String,
  pub core: String,
  pub meta: String,
}

impl Version {
  /// Parse a full version string such as `1.2.3+ent`.
  pub fn parse(full: &str) -> Self {
    let (core, meta) = full.split_once('+').unwrap_or((full, ""));
    Self {
      full: full.to_string(),
      core: core.to_string(),
      meta: meta.to_string(),
    }
  }

  pub fn init(self) -> Result<Self, ConfigError> {
    if !self.full.is_empty() {
      let parsed = Self::parse(&self.full);
      if !self.core.is_empty() && self.core != parsed.core {
        return Err(ConfigError::invalid(
          "product version",
          format!("core {:?} does not match full version {:?}", self.core, self.full),
        ));
      }
      if !self.meta.is_empty() && self.meta != parsed.meta {
        return Err(ConfigError::invalid(
          "product version",
          format!("meta {:?} does not match full version {:?}", self.meta, self.full),
        ));
      }
      if parsed.core.is_empty() {
        return Err(ConfigError::invalid("product version", format!("{:?} has no core version", self.full)));
      }
      return Ok(parsed);
    }

    if self.core.is_empty() {
      return Err(ConfigError::Missing("product version"));
    }
    if self.core.contains('+') {
      return Err(ConfigError::invalid(
        "product version",
        format!("core {:?} must not carry metadata; set meta instead", self.core),
      ));
    }

    let full = if self.meta.is_empty() {
      self.core.clone()
    } else {
      format!("{}+{}", self.core, self.meta)
    };
    Ok(Self { full, ..self })
  }
}

impl std::fmt::Display for Version {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.full)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
  /// Repository slug, e.g. `hashicorp/lockbox`.
  pub repository: String,
  /// Go module path.
  pub module: String,
  pub name: String,
  /// The name without an enterprise suffix.
  pub core_name: String,
  /// Base name of the executable the instructions must produce.
  pub executable_name: String,
  pub version: Version,
  /// Commit SHA.
  pub revision: String,
  /// Commit time, RFC3339 in UTC.
  pub revision_time: String,
  /// Equals `revision` for a clean worktree.
  pub source_hash: String,
}

impl Product {
  /// Validate required fields and fill derived ones.
  ///
  /// Idempotent: `p.init()?.init()? == p.init()?`.
  pub fn init(self) -> Result<Self, ConfigError> {
    let name = match (self.name.is_empty(), repo_basename(&self.repository)) {
      (false, _) => self.name,
      (true, Some(base)) => base.to_string(),
      (true, None) => return Err(ConfigError::Missing("product name")),
    };

    if self.revision.is_empty() {
      return Err(ConfigError::Missing("product revision"));
    }
    if self.revision_time.is_empty() {
      return Err(ConfigError::Missing("product revision time"));
    }
    let revision_time = parse_revision_time(&self.revision_time)?.to_rfc3339_opts(SecondsFormat::AutoSi, true);

    let module = if self.module.is_empty() && !self.repository.is_empty() {
      format!("github.com/{}", self.repository)
    } else {
      self.module
    };
    let core_name = name.strip_suffix(ENTERPRISE_SUFFIX).unwrap_or(&name).to_string();
    let executable_name = if self.executable_name.is_empty() {
      name.clone()
    } else {
      self.executable_name
    };
    let source_hash = if self.source_hash.is_empty() {
      self.revision.clone()
    } else {
      self.source_hash
    };

    Ok(Self {
      repository: self.repository,
      module,
      name,
      core_name,
      executable_name,
      version: self.version.init()?,
      revision: self.revision,
      revision_time,
      source_hash,
    })
  }

  /// True when the source differs from the committed revision.
  pub fn is_dirty(&self) -> bool {
    self.source_hash != self.revision
  }

  pub fn revision_timestamp(&self) -> Result<DateTime<Utc>, ConfigError> {
    parse_revision_time(&self.revision_time)
  }

  /// Last path component of the repository slug.
  pub fn repository_basename(&self) -> Option<&str> {
    repo_basename(&self.repository)
  }
}

fn repo_basename(repository: &str) -> Option<&str> {
  repository.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}

fn parse_revision_time(value: &str) -> Result<DateTime<Utc>, ConfigError> {
  DateTime::parse_from_rfc3339(value)
    .map(|t| t.with_timezone(&Utc))
    .map_err(|e| ConfigError::invalid("product revision time", format!("{:?}: {}", value, e)))
}
