use serde::{Deserialize, Serialize};

use super::CrnIdentity;

/// A service bound to an endpoint gateway
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceBinding {
    pub id: String,
    pub name: String,
    pub lifecycle_state: String,
    pub target: BindingTarget,
    #[serde(default)]
    pub service_endpoint: Option<String>,
    #[serde(default, rename = "type")]
    pub binding_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BindingTarget {
    pub crn: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceBindingPrototype {
    pub target: CrnIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceBindingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binding_prototype_body() {
        let body = ResourceBindingPrototype {
            target: CrnIdentity {
                crn: "crn:v1:bluemix:public:cloud-object-storage:global:a/123:bucket".into(),
            },
            name: Some("cos-binding".into()),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "target": {"crn": "crn:v1:bluemix:public:cloud-object-storage:global:a/123:bucket"},
                "name": "cos-binding"
            })
        );
    }
}
