//! Point-in-time DYOR document schema. Every leaf is optional: the parser
//! instructs the model to emit null for absent fields, and decoding must not
//! invent data.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DyorReport {
    pub document_title: Option<String>,
    #[serde(default)]
    pub metadata: ReportMetadata,
    #[serde(default)]
    pub general_info: GeneralInfo,
    pub summary: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub social_media: SocialMedia,
    #[serde(default)]
    pub investments: Vec<InvestmentRound>,
    #[serde(default)]
    pub additional_info: AdditionalInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub source: Option<String>,
    pub date_created: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralInfo {
    pub project_name: Option<String>,
    pub research_date: Option<String>,
    #[serde(default)]
    pub token_info: TokenInfo,
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token_chain: Option<String>,
    pub token_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_title: Option<String>,
    pub content: Option<String>,
    #[serde(default)]
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub subsection_title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub contacts: Contacts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contacts {
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub other: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMedia {
    #[serde(default)]
    pub platforms: Vec<PlatformEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub name: Option<String>,
    pub url: Option<String>,
    pub followers: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentRound {
    pub round_name: Option<String>,
    pub date: Option<String>,
    pub amount_raised: Option<String>,
    #[serde(default)]
    pub investors: Vec<Investor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Investor {
    pub name: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub notes: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub description: Option<String>,
    pub url: Option<String>,
}

impl DyorReport {
    pub fn project_name(&self) -> Option<&str> {
        self.general_info.project_name.as_deref()
    }

    pub fn token_address(&self) -> Option<&str> {
        self.general_info.token_info.token_address.as_deref()
    }

    pub fn token_chain(&self) -> Option<&str> {
        self.general_info.token_info.token_chain.as_deref()
    }
}
