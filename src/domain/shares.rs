use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Allowed distance between the sum of all shares and 1.0.
pub const SHARE_SUM_TOLERANCE: f64 = 0.001;

/// One group member and the fraction of every expense they are responsible for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub share: f64,
}

impl Member {
    pub fn new(name: impl Into<String>, share: f64) -> Self {
        Self {
            name: name.into(),
            share,
        }
    }

    /// Share as a whole-ish percentage for display, e.g. "30%" or "33.3%".
    pub fn percent_label(&self) -> String {
        let percent = (self.share * 1000.0).round() / 10.0;
        if percent.fract() == 0.0 {
            format!("{}%", percent as i64)
        } else {
            format!("{:.1}%", percent)
        }
    }
}

/// Validated member -> share assignment. Member order is display order.
///
/// A `ShareMapping` always satisfies: at least one member, unique non-empty names,
/// every share within [0, 1], shares summing to 1.0 within [`SHARE_SUM_TOLERANCE`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ShareMapping {
    members: Vec<Member>,
}

impl ShareMapping {
    /// Validate `members`. Surrounding whitespace is trimmed from names first.
    pub fn new(mut members: Vec<Member>) -> Result<Self, ValidationError> {
        for member in &mut members {
            member.name = member.name.trim().to_string();
        }
        validate_members(&members)?;
        Ok(Self { members })
    }

    /// Three members on a 30/30/40 split.
    pub fn default_group() -> Self {
        Self {
            members: vec![
                Member::new("Alice", 0.30),
                Member::new("Bob", 0.30),
                Member::new("Carol", 0.40),
            ],
        }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    pub fn share_of(&self, name: &str) -> Option<f64> {
        self.members.iter().find(|m| m.name == name).map(|m| m.share)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.share_of(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for ShareMapping {
    fn default() -> Self {
        Self::default_group()
    }
}

impl<'de> Deserialize<'de> for ShareMapping {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let members = Vec::<Member>::deserialize(deserializer)?;
        ShareMapping::new(members).map_err(serde::de::Error::custom)
    }
}

pub fn share_sum(members: &[Member]) -> f64 {
    members.iter().map(|m| m.share).sum()
}

fn validate_members(members: &[Member]) -> Result<(), ValidationError> {
    if members.is_empty() {
        return Err(ValidationError::EmptyMapping);
    }

    for (i, member) in members.iter().enumerate() {
        if member.name.is_empty() {
            return Err(ValidationError::MissingField("member name"));
        }
        if members[..i].iter().any(|m| m.name == member.name) {
            return Err(ValidationError::DuplicateMember(member.name.clone()));
        }
        if !(0.0..=1.0).contains(&member.share) {
            return Err(ValidationError::ShareOutOfRange {
                member: member.name.clone(),
                share: member.share,
            });
        }
    }

    let sum = share_sum(members);
    if (sum - 1.0).abs() > SHARE_SUM_TOLERANCE {
        return Err(ValidationError::ShareSumMismatch { sum });
    }
    Ok(())
}
