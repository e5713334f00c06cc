use serde::Deserialize;
use serde::Serialize;

/// One keytab identity row from the secret store's data file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub hostname: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub keytab_file_path: Option<String>,
    #[serde(default)]
    pub keytab_file_owner_name: Option<String>,
    #[serde(default)]
    pub keytab_file_owner_access: Option<String>,
    #[serde(default)]
    pub keytab_file_group_name: Option<String>,
    #[serde(default)]
    pub keytab_file_group_access: Option<String>,
}

/// Side-channel entry attached to keytab commands.
///
/// Removal entries only carry the identity (hostname, service, component,
/// principal and keytab path). Set entries also carry ownership metadata
/// and the base64-encoded keytab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeytabParams {
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keytab_file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keytab_file_owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keytab_file_owner_access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keytab_file_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keytab_file_group_access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keytab_content_base64: Option<String>,
}

impl KeytabParams {
    pub fn for_removal(record: &IdentityRecord) -> Self {
        Self {
            hostname: record.hostname.clone(),
            service: record.service.clone(),
            component: record.component.clone(),
            principal: record.principal.clone(),
            keytab_file_path: record.keytab_file_path.clone(),
            ..Default::default()
        }
    }

    pub fn with_content(
        record: &IdentityRecord,
        content_base64: String,
    ) -> Self {
        Self {
            keytab_file_owner_name: record.keytab_file_owner_name.clone(),
            keytab_file_owner_access: record.keytab_file_owner_access.clone(),
            keytab_file_group_name: record.keytab_file_group_name.clone(),
            keytab_file_group_access: record.keytab_file_group_access.clone(),
            keytab_content_base64: Some(content_base64),
            ..Self::for_removal(record)
        }
    }
}
