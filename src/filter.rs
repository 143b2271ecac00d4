use crate::calculations::utilization::{AllocationBucket, is_overallocated};
use crate::resource::{MediaType, Resource, ResourceType};
use serde::{Deserialize, Serialize};

/// Media-type predicate. `Unspecified` selects resources that declare no media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaTypeFilter {
    Is(MediaType),
    Unspecified,
}

impl MediaTypeFilter {
    pub fn matches(self, media_type: Option<MediaType>) -> bool {
        match self {
            MediaTypeFilter::Is(expected) => media_type == Some(expected),
            MediaTypeFilter::Unspecified => media_type.is_none(),
        }
    }
}

impl From<String> for MediaTypeFilter {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("unspecified") || trimmed.eq_ignore_ascii_case("none") {
            MediaTypeFilter::Unspecified
        } else {
            MediaTypeFilter::Is(MediaType::from_label(trimmed))
        }
    }
}

impl From<MediaTypeFilter> for String {
    fn from(value: MediaTypeFilter) -> Self {
        match value {
            MediaTypeFilter::Is(media) => media.as_str().to_string(),
            MediaTypeFilter::Unspecified => "unspecified".to_string(),
        }
    }
}

/// Predicates combined with AND. Resource predicates run before aggregation so a
/// filtered-out resource contributes nothing; `overallocated_only` runs on the
/// classified buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaTypeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub overallocated_only: bool,
}

impl ResourceFilter {
    pub fn is_empty(&self) -> bool {
        !self.has_resource_predicates() && !self.overallocated_only
    }

    pub fn has_resource_predicates(&self) -> bool {
        self.resource_type.is_some() || self.media_type.is_some() || self.team_id.is_some()
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        if let Some(kind) = self.resource_type {
            if resource.resource_type != kind {
                return false;
            }
        }
        if let Some(media) = self.media_type {
            if !media.matches(resource.media_type) {
                return false;
            }
        }
        if let Some(team_id) = self.team_id.as_deref() {
            if resource.team_id.as_deref() != Some(team_id) {
                return false;
            }
        }
        true
    }

    pub fn select_resources<'a>(&self, resources: &'a [Resource]) -> Vec<&'a Resource> {
        resources
            .iter()
            .filter(|resource| self.matches(resource))
            .collect()
    }

    pub fn retain_buckets(&self, buckets: Vec<AllocationBucket>) -> Vec<AllocationBucket> {
        if !self.overallocated_only {
            return buckets;
        }
        buckets.into_iter().filter(is_overallocated).collect()
    }
}
