use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    #[default]
    Internal,
    Agency,
    Freelancer,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Internal => "internal",
            ResourceType::Agency => "agency",
            ResourceType::Freelancer => "freelancer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceType::Internal => "Internal",
            ResourceType::Agency => "Agency",
            ResourceType::Freelancer => "Freelancer",
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "internal" => Ok(ResourceType::Internal),
            "agency" => Ok(ResourceType::Agency),
            "freelancer" | "freelance" => Ok(ResourceType::Freelancer),
            other => Err(format!("unknown resource type '{other}'")),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel a resource works in. Free-form labels collapse into this bounded set,
/// with anything unrecognised landing in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Digital,
    Social,
    Print,
    Video,
    Audio,
    OutOfHome,
    Event,
    Other,
}

impl MediaType {
    pub const ALL: [MediaType; 8] = [
        MediaType::Digital,
        MediaType::Social,
        MediaType::Print,
        MediaType::Video,
        MediaType::Audio,
        MediaType::OutOfHome,
        MediaType::Event,
        MediaType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Digital => "digital",
            MediaType::Social => "social",
            MediaType::Print => "print",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::OutOfHome => "out_of_home",
            MediaType::Event => "event",
            MediaType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MediaType::Digital => "Digital",
            MediaType::Social => "Social",
            MediaType::Print => "Print",
            MediaType::Video => "Video",
            MediaType::Audio => "Audio",
            MediaType::OutOfHome => "Out of home",
            MediaType::Event => "Event",
            MediaType::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "digital" | "display" | "web" | "online" | "search" | "email" => MediaType::Digital,
            "social" | "social_media" => MediaType::Social,
            "print" | "press" | "magazine" | "newspaper" => MediaType::Print,
            "video" | "tv" | "television" | "broadcast" | "film" => MediaType::Video,
            "audio" | "radio" | "podcast" => MediaType::Audio,
            "out_of_home" | "ooh" | "billboard" | "outdoor" => MediaType::OutOfHome,
            "event" | "events" | "experiential" => MediaType::Event,
            _ => MediaType::Other,
        }
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        MediaType::from_label(&value)
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person, agency, or freelancer that can be assigned briefs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    /// Display label; the id is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "type")]
    pub resource_type: ResourceType,
    /// Weekly capacity in hours. The engine's configured default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_hours_per_week: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// Weak reference to a team; no ownership is implied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl Resource {
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: None,
            resource_type,
            capacity_hours_per_week: None,
            media_type: None,
            team_id: None,
        }
    }

    pub fn with_capacity(mut self, hours_per_week: f64) -> Self {
        self.capacity_hours_per_week = Some(hours_per_week);
        self
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Capacity after applying the default. Non-positive or non-finite values count as zero.
    pub fn weekly_capacity(&self, default_hours: f64) -> f64 {
        match self.capacity_hours_per_week {
            Some(hours) if hours.is_finite() && hours > 0.0 => hours,
            Some(_) => 0.0,
            None => default_hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
}

impl Team {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
