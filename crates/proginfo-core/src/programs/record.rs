//! The installed-program record.

use super::locale::Locale;
use crate::config::BackupConfig;
use crate::icon::IconReference;
use crate::serializer::{EstimatedSizePostProcess, PropertyMapping, RegistryRecord};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Raw icon image bytes attached to a record.
///
/// Ignored by equality, hashing and JSON so records compare by their
/// metadata alone.
#[derive(Clone, Default)]
pub struct IconPayload(pub Option<Vec<u8>>);

impl IconPayload {
    pub fn bytes(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for IconPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(bytes) => write!(f, "IconPayload({} bytes)", bytes.len()),
            None => f.write_str("IconPayload(None)"),
        }
    }
}

impl PartialEq for IconPayload {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for IconPayload {}

impl Hash for IconPayload {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One installed program as registered under an uninstall key.
///
/// Unknown strings are `None` (or empty), unknown numbers are `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ProgramRecord {
    /// Backend tag; always the registry source for records built here.
    pub source_key: String,
    /// Name of the uninstall subkey.
    pub id: String,
    #[serde(rename = "AuthorizedCDFPrefix", skip_serializing_if = "Option::is_none")]
    pub authorized_cdf_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip)]
    pub display_icon_payload: IconPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_icon_info: Option<IconReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_version: Option<String>,
    /// Size in bytes.
    pub estimated_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_telephone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_source: Option<String>,
    /// Resolved from `language`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    /// Decimal LCID as stored in the registry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modify_path: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub no_modify: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub no_remove: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub no_repair: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub system_component: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet_uninstall_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uninstall_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_info_about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_update_info: Option<String>,
    pub version_major: i32,
    pub version_minor: i32,
    #[serde(skip_serializing_if = "is_false")]
    pub windows_installer: bool,
    /// Full path of the uninstall subkey this record was read from.
    pub reg_key: String,
}

impl Default for ProgramRecord {
    fn default() -> Self {
        Self {
            source_key: BackupConfig::SOURCE_KEY_NAME.to_string(),
            id: String::new(),
            authorized_cdf_prefix: None,
            comments: None,
            contact: None,
            display_icon_payload: IconPayload::default(),
            display_icon_info: None,
            display_icon: None,
            display_name: None,
            display_version: None,
            estimated_size: -1,
            help_link: None,
            help_telephone: None,
            install_date: None,
            install_location: None,
            install_source: None,
            locale: None,
            language: None,
            modify_path: None,
            no_modify: false,
            no_remove: false,
            no_repair: false,
            publisher: None,
            readme: None,
            system_component: false,
            quiet_uninstall_string: None,
            uninstall_string: None,
            url_info_about: None,
            url_update_info: None,
            version_major: -1,
            version_minor: -1,
            windows_installer: false,
            reg_key: String::new(),
        }
    }
}

impl fmt::Display for ProgramRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.display_name.as_deref().unwrap_or_default(),
            self.reg_key
        )
    }
}

fn known(value: i64) -> Option<i64> {
    (value != -1).then_some(value)
}

fn known_i32(value: i32) -> Option<i32> {
    (value != -1).then_some(value)
}

fn is_unknown_str(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn fill_str(target: &mut Option<String>, source: &Option<String>) {
    if is_unknown_str(target) {
        target.clone_from(source);
    }
}

fn fill_opt<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

fn update_opt<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if source.is_some() {
        target.clone_from(source);
    }
}

impl ProgramRecord {
    /// Display name, if known and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Copy every field of `other` into fields of `self` that are still
    /// unknown. Flags are left alone; they have no unknown state.
    pub fn fill_unknown_from(&mut self, other: &ProgramRecord) {
        if self.id.is_empty() {
            self.id.clone_from(&other.id);
        }
        fill_str(&mut self.authorized_cdf_prefix, &other.authorized_cdf_prefix);
        fill_str(&mut self.comments, &other.comments);
        fill_str(&mut self.contact, &other.contact);
        if self.display_icon_payload.is_empty() {
            self.display_icon_payload = other.display_icon_payload.clone();
        }
        fill_opt(&mut self.display_icon_info, &other.display_icon_info);
        fill_str(&mut self.display_icon, &other.display_icon);
        fill_str(&mut self.display_name, &other.display_name);
        fill_str(&mut self.display_version, &other.display_version);
        if self.estimated_size == -1 {
            self.estimated_size = other.estimated_size;
        }
        fill_str(&mut self.help_link, &other.help_link);
        fill_str(&mut self.help_telephone, &other.help_telephone);
        fill_opt(&mut self.install_date, &other.install_date);
        fill_str(&mut self.install_location, &other.install_location);
        fill_str(&mut self.install_source, &other.install_source);
        fill_opt(&mut self.locale, &other.locale);
        fill_str(&mut self.language, &other.language);
        fill_str(&mut self.modify_path, &other.modify_path);
        fill_str(&mut self.publisher, &other.publisher);
        fill_str(&mut self.readme, &other.readme);
        fill_str(&mut self.quiet_uninstall_string, &other.quiet_uninstall_string);
        fill_str(&mut self.uninstall_string, &other.uninstall_string);
        fill_str(&mut self.url_info_about, &other.url_info_about);
        fill_str(&mut self.url_update_info, &other.url_update_info);
        if self.version_major == -1 {
            self.version_major = other.version_major;
        }
        if self.version_minor == -1 {
            self.version_minor = other.version_minor;
        }
        if self.reg_key.is_empty() {
            self.reg_key.clone_from(&other.reg_key);
        }
    }

    /// Take over every value `other` has. Optional fields `other` leaves
    /// unset keep their current value.
    pub fn update_from(&mut self, other: &ProgramRecord) {
        self.source_key.clone_from(&other.source_key);
        self.id.clone_from(&other.id);
        update_opt(&mut self.authorized_cdf_prefix, &other.authorized_cdf_prefix);
        update_opt(&mut self.comments, &other.comments);
        update_opt(&mut self.contact, &other.contact);
        if !other.display_icon_payload.is_empty() {
            self.display_icon_payload = other.display_icon_payload.clone();
        }
        update_opt(&mut self.display_icon_info, &other.display_icon_info);
        update_opt(&mut self.display_icon, &other.display_icon);
        update_opt(&mut self.display_name, &other.display_name);
        update_opt(&mut self.display_version, &other.display_version);
        self.estimated_size = other.estimated_size;
        update_opt(&mut self.help_link, &other.help_link);
        update_opt(&mut self.help_telephone, &other.help_telephone);
        update_opt(&mut self.install_date, &other.install_date);
        update_opt(&mut self.install_location, &other.install_location);
        update_opt(&mut self.install_source, &other.install_source);
        update_opt(&mut self.locale, &other.locale);
        update_opt(&mut self.language, &other.language);
        update_opt(&mut self.modify_path, &other.modify_path);
        self.no_modify = other.no_modify;
        self.no_remove = other.no_remove;
        self.no_repair = other.no_repair;
        update_opt(&mut self.publisher, &other.publisher);
        update_opt(&mut self.readme, &other.readme);
        self.system_component = other.system_component;
        update_opt(&mut self.quiet_uninstall_string, &other.quiet_uninstall_string);
        update_opt(&mut self.uninstall_string, &other.uninstall_string);
        update_opt(&mut self.url_info_about, &other.url_info_about);
        update_opt(&mut self.url_update_info, &other.url_update_info);
        self.version_major = other.version_major;
        self.version_minor = other.version_minor;
        self.windows_installer = other.windows_installer;
        self.reg_key.clone_from(&other.reg_key);
    }
}

impl RegistryRecord for ProgramRecord {
    fn mappings() -> Vec<PropertyMapping<Self>> {
        vec![
            PropertyMapping::<Self>::ignored("SourceKey"),
            PropertyMapping::<Self>::ignored("Id"),
            PropertyMapping::<Self>::string(
                "AuthorizedCDFPrefix",
                |r, v| r.authorized_cdf_prefix = Some(v),
                |r| r.authorized_cdf_prefix.as_deref(),
            ),
            PropertyMapping::<Self>::string("Comments", |r, v| r.comments = Some(v), |r| r.comments.as_deref()),
            PropertyMapping::<Self>::string("Contact", |r, v| r.contact = Some(v), |r| r.contact.as_deref()),
            PropertyMapping::<Self>::ignored("DisplayIconStream"),
            PropertyMapping::<Self>::ignored("DisplayIconInfo"),
            PropertyMapping::<Self>::string(
                "DisplayIcon",
                |r, v| r.display_icon = Some(v),
                |r| r.display_icon.as_deref(),
            ),
            PropertyMapping::<Self>::string(
                "DisplayName",
                |r, v| r.display_name = Some(v),
                |r| r.display_name.as_deref(),
            ),
            PropertyMapping::<Self>::string(
                "DisplayVersion",
                |r, v| r.display_version = Some(v),
                |r| r.display_version.as_deref(),
            ),
            PropertyMapping::<Self>::long("EstimatedSize", |r, v| r.estimated_size = v, |r| known(r.estimated_size))
                .names(&["EstimatedSize", "Size"])
                .post_process(Arc::new(EstimatedSizePostProcess)),
            PropertyMapping::<Self>::string("HelpLink", |r, v| r.help_link = Some(v), |r| r.help_link.as_deref()),
            PropertyMapping::<Self>::string(
                "HelpTelephone",
                |r, v| r.help_telephone = Some(v),
                |r| r.help_telephone.as_deref(),
            ),
            PropertyMapping::<Self>::date_time("InstallDate", |r, v| r.install_date = Some(v), |r| r.install_date),
            PropertyMapping::<Self>::string(
                "InstallLocation",
                |r, v| r.install_location = Some(v),
                |r| r.install_location.as_deref(),
            )
            .names(&["InstallLocation", "InstallDir"]),
            PropertyMapping::<Self>::string(
                "InstallSource",
                |r, v| r.install_source = Some(v),
                |r| r.install_source.as_deref(),
            ),
            PropertyMapping::<Self>::ignored("CultureInfo"),
            PropertyMapping::<Self>::string("Language", |r, v| r.language = Some(v), |r| r.language.as_deref()),
            PropertyMapping::<Self>::string("ModifyPath", |r, v| r.modify_path = Some(v), |r| r.modify_path.as_deref()),
            PropertyMapping::<Self>::bool("NoModify", |r, v| r.no_modify = v, |r| r.no_modify),
            PropertyMapping::<Self>::bool("NoRemove", |r, v| r.no_remove = v, |r| r.no_remove),
            PropertyMapping::<Self>::bool("NoRepair", |r, v| r.no_repair = v, |r| r.no_repair),
            PropertyMapping::<Self>::string("Publisher", |r, v| r.publisher = Some(v), |r| r.publisher.as_deref()),
            PropertyMapping::<Self>::string("Readme", |r, v| r.readme = Some(v), |r| r.readme.as_deref()),
            PropertyMapping::<Self>::bool("SystemComponent", |r, v| r.system_component = v, |r| r.system_component),
            PropertyMapping::<Self>::string(
                "QuietUninstallString",
                |r, v| r.quiet_uninstall_string = Some(v),
                |r| r.quiet_uninstall_string.as_deref(),
            ),
            PropertyMapping::<Self>::string(
                "UninstallString",
                |r, v| r.uninstall_string = Some(v),
                |r| r.uninstall_string.as_deref(),
            ),
            PropertyMapping::<Self>::string(
                "URLInfoAbout",
                |r, v| r.url_info_about = Some(v),
                |r| r.url_info_about.as_deref(),
            ),
            PropertyMapping::<Self>::string(
                "URLUpdateInfo",
                |r, v| r.url_update_info = Some(v),
                |r| r.url_update_info.as_deref(),
            ),
            PropertyMapping::<Self>::int("VersionMajor", |r, v| r.version_major = v, |r| known_i32(r.version_major))
                .names(&["VersionMajor", "MajorVersion"]),
            PropertyMapping::<Self>::int("VersionMinor", |r, v| r.version_minor = v, |r| known_i32(r.version_minor))
                .names(&["VersionMinor", "MinorVersion"]),
            PropertyMapping::<Self>::bool("WindowsInstaller", |r, v| r.windows_installer = v, |r| r.windows_installer),
            PropertyMapping::<Self>::ignored("RegKey"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_unknown() {
        let record = ProgramRecord::default();
        assert_eq!(record.source_key, "Windows Registry");
        assert_eq!(record.estimated_size, -1);
        assert_eq!(record.version_major, -1);
        assert_eq!(record.version_minor, -1);
        assert_eq!(record.name(), None);
    }

    #[test]
    fn test_equality_ignores_icon_payload() {
        let mut a = ProgramRecord {
            display_name: Some("Foo".into()),
            ..ProgramRecord::default()
        };
        let b = a.clone();
        a.display_icon_payload = IconPayload(Some(vec![1, 2, 3]));
        assert_eq!(a, b);

        use std::collections::hash_map::DefaultHasher;
        let hash = |r: &ProgramRecord| {
            let mut h = DefaultHasher::new();
            r.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_json_omits_unset_fields() {
        let record = ProgramRecord {
            id: "Foo".into(),
            display_name: Some("Foo".into()),
            reg_key: r"HKEY_CURRENT_USER\Software\Foo".into(),
            ..ProgramRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object["DisplayName"], "Foo");
        assert_eq!(object["EstimatedSize"], -1);
        assert!(!object.contains_key("Publisher"));
        assert!(!object.contains_key("NoRemove"));
        assert!(!object.contains_key("DisplayIconPayload"));

        let back: ProgramRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_display() {
        let record = ProgramRecord {
            display_name: Some("Foo".into()),
            reg_key: r"HKLM\X\Foo".into(),
            ..ProgramRecord::default()
        };
        assert_eq!(record.to_string(), r"Foo - HKLM\X\Foo");
    }

    #[test]
    fn test_fill_unknown_keeps_known_values() {
        let mut target = ProgramRecord {
            display_name: Some("Foo".into()),
            publisher: Some(String::new()),
            version_major: 2,
            ..ProgramRecord::default()
        };
        let source = ProgramRecord {
            display_name: Some("Other".into()),
            publisher: Some("ACME".into()),
            version_major: 9,
            estimated_size: 1000,
            no_remove: true,
            ..ProgramRecord::default()
        };
        target.fill_unknown_from(&source);
        assert_eq!(target.display_name.as_deref(), Some("Foo"));
        assert_eq!(target.publisher.as_deref(), Some("ACME"));
        assert_eq!(target.version_major, 2);
        assert_eq!(target.estimated_size, 1000);
        assert!(!target.no_remove);
    }

    #[test]
    fn test_update_from_copies_set_values() {
        let mut target = ProgramRecord {
            display_name: Some("Foo".into()),
            comments: Some("keep".into()),
            ..ProgramRecord::default()
        };
        let source = ProgramRecord {
            display_name: Some("Foo 2".into()),
            no_modify: true,
            estimated_size: 10,
            ..ProgramRecord::default()
        };
        target.update_from(&source);
        assert_eq!(target.display_name.as_deref(), Some("Foo 2"));
        assert_eq!(target.comments.as_deref(), Some("keep"));
        assert!(target.no_modify);
        assert_eq!(target.estimated_size, 10);
    }

    #[test]
    fn test_mapping_table_skips_caller_assigned_fields() {
        let mapped: Vec<_> = ProgramRecord::mappings()
            .into_iter()
            .filter(|m| !m.is_ignored())
            .map(|m| m.field())
            .collect();
        assert!(!mapped.contains(&"Id"));
        assert!(!mapped.contains(&"RegKey"));
        assert!(mapped.contains(&"EstimatedSize"));
        assert_eq!(mapped.len(), 27);
    }

    #[test]
    fn test_mapping_table_alternate_names() {
        let mappings = ProgramRecord::mappings();
        let names = |field: &str| {
            mappings
                .iter()
                .find(|m| m.field() == field)
                .map(|m| m.candidate_names().to_vec())
                .unwrap()
        };
        assert_eq!(names("EstimatedSize"), ["EstimatedSize", "Size"]);
        assert_eq!(names("InstallLocation"), ["InstallLocation", "InstallDir"]);
        assert_eq!(names("VersionMajor"), ["VersionMajor", "MajorVersion"]);
        assert_eq!(names("Publisher"), ["Publisher"]);
        assert!(mappings
            .iter()
            .find(|m| m.field() == "EstimatedSize")
            .unwrap()
            .post_processor()
            .is_some());
    }
}
