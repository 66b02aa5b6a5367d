//! Content rows stored in the hosted data API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::{Filter, Query};
use crate::YedalmError;

/// A row type bound to one collection of the data API
pub trait Row: Serialize + DeserializeOwned + Clone + Send + Sync + std::fmt::Debug + 'static {
    /// Collection (table) name
    const COLLECTION: &'static str;
}

/// A row with a stable id and an explicit display position
pub trait Record: Row {
    /// Whether the row carries an `is_active` flag that hides it from the public page
    const HAS_ACTIVE_FLAG: bool;

    /// Editor payload for add: the display fields only
    type Draft: Validate
        + Serialize
        + DeserializeOwned
        + Clone
        + Send
        + Sync
        + std::fmt::Debug
        + 'static;

    /// Editor payload for edit: only the fields present are written
    type Patch: Validate
        + Serialize
        + DeserializeOwned
        + Clone
        + Send
        + Sync
        + std::fmt::Debug
        + 'static;

    fn id(&self) -> i64;

    fn order_index(&self) -> i32;

    fn set_order_index(&mut self, order_index: i32);

    /// Query used for listings: active rows only (where flagged), by position
    fn public_query() -> Query {
        let query = Query::new().order_by("order_index");
        if Self::HAS_ACTIVE_FLAG {
            query.filter(Filter::eq("is_active", "true"))
        } else {
            query
        }
    }
}

/// Required-field check run before an editor payload is saved
pub trait Validate {
    fn validate(&self) -> crate::Result<()>;
}

fn require(field: &str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        Err(YedalmError::Site(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn require_if_present(field: &str, value: Option<&String>) -> crate::Result<()> {
    value.map_or(Ok(()), |value| require(field, value))
}

fn require_some_field(present: &[bool]) -> crate::Result<()> {
    if present.iter().any(|p| *p) {
        Ok(())
    } else {
        Err(YedalmError::Site("no fields to update".to_string()))
    }
}

/// A hero image shown in the rotating slider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    pub order_index: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDraft {
    pub title: String,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for SlideDraft {
    fn validate(&self) -> crate::Result<()> {
        require("title", &self.title)?;
        require("image_url", &self.image_url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlidePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Validate for SlidePatch {
    fn validate(&self) -> crate::Result<()> {
        require_some_field(&[
            self.title.is_some(),
            self.image_url.is_some(),
            self.description.is_some(),
        ])?;
        require_if_present("title", self.title.as_ref())?;
        require_if_present("image_url", self.image_url.as_ref())
    }
}

impl Row for Slide {
    const COLLECTION: &'static str = "slide_images";
}

impl Record for Slide {
    const HAS_ACTIVE_FLAG: bool = true;
    type Draft = SlideDraft;
    type Patch = SlidePatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn order_index(&self) -> i32 {
        self.order_index
    }

    fn set_order_index(&mut self, order_index: i32) {
        self.order_index = order_index;
    }
}

/// A person listed inside an organization card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub image_url: String,
}

/// One box of the organization chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<Member>,
    pub order_index: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Organization {
    /// Image of the first member, used as the card thumbnail
    pub fn thumbnail(&self) -> Option<&str> {
        self.members
            .first()
            .map(|m| m.image_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Validate for OrganizationDraft {
    fn validate(&self) -> crate::Result<()> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<Member>>,
}

impl Validate for OrganizationPatch {
    fn validate(&self) -> crate::Result<()> {
        require_some_field(&[
            self.name.is_some(),
            self.description.is_some(),
            self.members.is_some(),
        ])?;
        require_if_present("name", self.name.as_ref())
    }
}

impl Row for Organization {
    const COLLECTION: &'static str = "organization";
}

impl Record for Organization {
    const HAS_ACTIVE_FLAG: bool = false;
    type Draft = OrganizationDraft;
    type Patch = OrganizationPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn order_index(&self) -> i32 {
        self.order_index
    }

    fn set_order_index(&mut self, order_index: i32) {
        self.order_index = order_index;
    }
}

/// A facility (room, hall, ...) listed on the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub order_index: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

impl Validate for FacilityDraft {
    fn validate(&self) -> crate::Result<()> {
        require("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacilityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Validate for FacilityPatch {
    fn validate(&self) -> crate::Result<()> {
        require_some_field(&[
            self.name.is_some(),
            self.description.is_some(),
            self.image_url.is_some(),
        ])?;
        require_if_present("name", self.name.as_ref())
    }
}

impl Row for Facility {
    const COLLECTION: &'static str = "facilities";
}

impl Record for Facility {
    const HAS_ACTIVE_FLAG: bool = true;
    type Draft = FacilityDraft;
    type Patch = FacilityPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn order_index(&self) -> i32 {
        self.order_index
    }

    fn set_order_index(&mut self, order_index: i32) {
        self.order_index = order_index;
    }
}

/// The scripture-of-the-week block. Only the active row is shown or edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scripture {
    pub id: i64,
    pub verse: String,
    pub reference: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptureDraft {
    pub verse: String,
    pub reference: String,
    #[serde(default)]
    pub description: String,
}

impl Validate for ScriptureDraft {
    fn validate(&self) -> crate::Result<()> {
        require("verse", &self.verse)
    }
}

impl Row for Scripture {
    const COLLECTION: &'static str = "scripture";
}

/// Admin settings row holding the console password
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminSettings {
    #[serde(default)]
    pub id: i64,
    pub password_hash: String,
}

impl std::fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSettings").field("id", &self.id).finish()
    }
}

impl Row for AdminSettings {
    const COLLECTION: &'static str = "admin_settings";
}

fn default_active() -> bool {
    true
}
