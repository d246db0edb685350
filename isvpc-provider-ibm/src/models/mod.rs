//! Typed views over VPC API payloads
//!
//! Responses deserialize into these structs; request bodies (`*Prototype`,
//! `*Patch`) serialize from them. Polymorphic references are enums tagged by
//! their `resource_type` field, with an `Unknown` fallback for variants the
//! API adds later.

use serde::{Deserialize, Serialize};

/// Present on references to objects that have been deleted
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Deleted {
    pub more_info: String,
}

/// Reference to another VPC object (VPC, ACL, routing table, security group, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Reference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Deleted>,
}

impl Reference {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ZoneReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Reserved IP as embedded in other objects
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReservedIpReference {
    #[serde(default)]
    pub id: String,
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub deleted: Option<Deleted>,
}

/// Body of one variant of a polymorphic target reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TargetReference {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub deleted: Option<Deleted>,
}

/// `{"id": ...}` in request bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// `{"name": ...}` in request bodies (zones, buckets)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameIdentity {
    pub name: String,
}

impl NameIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// `{"crn": ...}` in request bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrnIdentity {
    pub crn: String,
}

/// Declare a reference union discriminated by `resource_type`.
///
/// Every listed variant carries a [`TargetReference`]; unlisted discriminators
/// deserialize to `Unknown`.
macro_rules! reference_union {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
        #[serde(tag = "resource_type")]
        pub enum $name {
            $(
                #[serde(rename = $tag)]
                $variant($crate::models::TargetReference),
            )+
            #[serde(other)]
            Unknown,
        }

        impl $name {
            /// The `resource_type` discriminator
            pub fn resource_type(&self) -> &'static str {
                match self {
                    $($name::$variant(_) => $tag,)+
                    $name::Unknown => "unknown",
                }
            }

            pub fn reference(&self) -> Option<&$crate::models::TargetReference> {
                match self {
                    $($name::$variant(r) => Some(r),)+
                    $name::Unknown => None,
                }
            }
        }
    };
}

pub(crate) use reference_union;

pub mod address_prefix;
pub mod endpoint_gateway;
pub mod flow_log;
pub mod public_gateway;
pub mod reserved_ip;
pub mod security_group;
pub mod subnet;
pub mod virtual_network_interface;
pub mod vpc;
