//! Static portfolio profile rendered on the home page.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SocialLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Owner profile shown in the hero, portfolio and contact sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub owner_name: String,
    pub handle: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub contact_email: Option<String>,
    pub links: Vec<SocialLink>,
    pub projects: Vec<Project>,
}

impl SiteProfile {
    pub fn mailto(&self) -> Option<String> {
        self.contact_email
            .as_deref()
            .map(|email| format!("mailto:{email}"))
    }

    pub fn initials(&self) -> String {
        self.owner_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}
