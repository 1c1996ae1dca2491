//! Identity and priority of prefetch requests.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::PrefetchError;

/// Kind of content a detail page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Tv,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
        }
    }

    /// Collection segment of the detail route (`/api/movies/..`, `/api/tv/..`).
    pub fn detail_segment(&self) -> &'static str {
        match self {
            ContentType::Movie => "movies",
            ContentType::Tv => "tv",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = PrefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(ContentType::Movie),
            "tv" => Ok(ContentType::Tv),
            other => Err(PrefetchError::InvalidContentType(other.to_string())),
        }
    }
}

/// Queue priority. `High` always drains before `Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Low,
}

impl Priority {
    /// Sort rank; lower drains first.
    pub(crate) fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Low => 1,
        }
    }

    /// The more urgent of the two.
    pub fn most_urgent(self, other: Priority) -> Priority {
        if self.rank() <= other.rank() {
            self
        } else {
            other
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::High => "high",
            Priority::Low => "low",
        })
    }
}

impl FromStr for Priority {
    type Err = PrefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "low" => Ok(Priority::Low),
            other => Err(PrefetchError::InvalidPriority(other.to_string())),
        }
    }
}

/// Identity of a prefetchable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKey {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub id: i64,
}

impl ContentKey {
    pub fn new(content_type: ContentType, id: i64) -> Self {
        Self { content_type, id }
    }

    pub fn movie(id: i64) -> Self {
        Self::new(ContentType::Movie, id)
    }

    pub fn tv(id: i64) -> Self {
        Self::new(ContentType::Tv, id)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.content_type, self.id)
    }
}

/// Parses `movie:10` or `movie-10`.
impl FromStr for ContentKey {
    type Err = PrefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrefetchError::InvalidKey(s.to_string());

        let (kind, id) = s.trim().split_once([':', '-']).ok_or_else(invalid)?;
        let content_type = kind.parse::<ContentType>().map_err(|_| invalid())?;
        let id = id.parse::<i64>().map_err(|_| invalid())?;
        if id <= 0 {
            return Err(invalid());
        }

        Ok(Self::new(content_type, id))
    }
}

/// A queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrefetchRequest {
    pub key: ContentKey,
    pub priority: Priority,
}
