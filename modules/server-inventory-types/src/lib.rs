//! Shared types for the server inventory service and its clients.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// File name offered for YAML downloads.
pub const EXPORT_FILE_NAME: &str = "servers.yaml";

/// Content type of the YAML export payload.
pub const YAML_CONTENT_TYPE: &str = "application/x-yaml";

// =====================================================
// Domain Types
// =====================================================

/// One inventory entry describing a server or database instance.
///
/// Every attribute is free text. Missing attributes deserialize as empty
/// strings and scalar values (numbers, booleans, null) are kept as their
/// text form, so hand-edited YAML files load without a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "scalar_text")]
    pub server_name: String,
    #[serde(deserialize_with = "scalar_text")]
    pub standort: String,
    #[serde(deserialize_with = "scalar_text")]
    pub dmz: String,
    #[serde(deserialize_with = "scalar_text")]
    pub verfuegbarkeit: String,
    #[serde(deserialize_with = "scalar_text")]
    pub schutzbedarf: String,
    #[serde(deserialize_with = "scalar_text")]
    pub art_der_umgebung: String,
    #[serde(deserialize_with = "scalar_text")]
    pub fqdn_prod: String,
    #[serde(deserialize_with = "scalar_text")]
    pub fqdn_admin: String,
    #[serde(deserialize_with = "scalar_text")]
    pub ip_prod: String,
    #[serde(deserialize_with = "scalar_text")]
    pub ip_admin: String,
    #[serde(deserialize_with = "scalar_text")]
    pub betriebssystem: String,
    #[serde(deserialize_with = "scalar_text")]
    pub dbms: String,
    #[serde(deserialize_with = "scalar_text")]
    pub dbms_edition: String,
    #[serde(deserialize_with = "scalar_text")]
    pub major_release: String,
    #[serde(deserialize_with = "scalar_text")]
    pub kunde: String,
    #[serde(deserialize_with = "scalar_text")]
    pub instanzname: String,
    #[serde(deserialize_with = "scalar_text")]
    pub verbindungsart: String,
    #[serde(deserialize_with = "scalar_text")]
    pub sicherungsmethode: String,
    #[serde(deserialize_with = "scalar_text")]
    pub verfahren_zweck: String,
    #[serde(deserialize_with = "scalar_text")]
    pub kommentar: String,
    #[serde(deserialize_with = "scalar_text")]
    pub clustername: String,
    #[serde(deserialize_with = "scalar_text")]
    pub itsm_business_service: String,
    #[serde(deserialize_with = "scalar_text")]
    pub lebenszyklus: String,
    #[serde(deserialize_with = "scalar_text")]
    pub support_ende: String,
    #[serde(deserialize_with = "scalar_text")]
    pub anzeigename: String,
    #[serde(deserialize_with = "scalar_text")]
    pub cc_und_mem: String,
    #[serde(deserialize_with = "scalar_text")]
    pub service: String,
}

/// A displayed column: wire key plus table/form label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
}

const fn column(key: &'static str, label: &'static str) -> Column {
    Column { key, label }
}

/// Columns in display order. Keys match the camelCase wire names.
pub const COLUMNS: &[Column] = &[
    column("serverName", "Server"),
    column("standort", "Standort"),
    column("dmz", "DMZ"),
    column("verfuegbarkeit", "Verfügbarkeit"),
    column("schutzbedarf", "Schutzbedarf"),
    column("artDerUmgebung", "Art der Umgebung"),
    column("fqdnProd", "FQDN (Prod)"),
    column("fqdnAdmin", "FQDN (Admin)"),
    column("ipProd", "IP (Prod)"),
    column("ipAdmin", "IP (Admin)"),
    column("betriebssystem", "Betriebssystem"),
    column("dbms", "DBMS"),
    column("dbmsEdition", "DBMS Edition"),
    column("majorRelease", "Major Release"),
    column("kunde", "Kunde"),
    column("instanzname", "Instanzname"),
    column("verbindungsart", "Verbindungsart"),
    column("sicherungsmethode", "Sicherungsmethode"),
    column("verfahrenZweck", "Verfahren / Zweck"),
    column("kommentar", "Kommentar"),
    column("clustername", "Clustername"),
    column("itsmBusinessService", "ITSM Business Service"),
    column("lebenszyklus", "Lebenszyklus"),
    column("supportEnde", "Support Ende"),
    column("anzeigename", "Anzeigename"),
    column("ccUndMem", "CC und MEM"),
    column("service", "Service"),
];

impl ServerRecord {
    /// Value of the column with the given wire key.
    pub fn field(&self, key: &str) -> Option<&str> {
        let value = match key {
            "serverName" => &self.server_name,
            "standort" => &self.standort,
            "dmz" => &self.dmz,
            "verfuegbarkeit" => &self.verfuegbarkeit,
            "schutzbedarf" => &self.schutzbedarf,
            "artDerUmgebung" => &self.art_der_umgebung,
            "fqdnProd" => &self.fqdn_prod,
            "fqdnAdmin" => &self.fqdn_admin,
            "ipProd" => &self.ip_prod,
            "ipAdmin" => &self.ip_admin,
            "betriebssystem" => &self.betriebssystem,
            "dbms" => &self.dbms,
            "dbmsEdition" => &self.dbms_edition,
            "majorRelease" => &self.major_release,
            "kunde" => &self.kunde,
            "instanzname" => &self.instanzname,
            "verbindungsart" => &self.verbindungsart,
            "sicherungsmethode" => &self.sicherungsmethode,
            "verfahrenZweck" => &self.verfahren_zweck,
            "kommentar" => &self.kommentar,
            "clustername" => &self.clustername,
            "itsmBusinessService" => &self.itsm_business_service,
            "lebenszyklus" => &self.lebenszyklus,
            "supportEnde" => &self.support_ende,
            "anzeigename" => &self.anzeigename,
            "ccUndMem" => &self.cc_und_mem,
            "service" => &self.service,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        let value = match key {
            "serverName" => &mut self.server_name,
            "standort" => &mut self.standort,
            "dmz" => &mut self.dmz,
            "verfuegbarkeit" => &mut self.verfuegbarkeit,
            "schutzbedarf" => &mut self.schutzbedarf,
            "artDerUmgebung" => &mut self.art_der_umgebung,
            "fqdnProd" => &mut self.fqdn_prod,
            "fqdnAdmin" => &mut self.fqdn_admin,
            "ipProd" => &mut self.ip_prod,
            "ipAdmin" => &mut self.ip_admin,
            "betriebssystem" => &mut self.betriebssystem,
            "dbms" => &mut self.dbms,
            "dbmsEdition" => &mut self.dbms_edition,
            "majorRelease" => &mut self.major_release,
            "kunde" => &mut self.kunde,
            "instanzname" => &mut self.instanzname,
            "verbindungsart" => &mut self.verbindungsart,
            "sicherungsmethode" => &mut self.sicherungsmethode,
            "verfahrenZweck" => &mut self.verfahren_zweck,
            "kommentar" => &mut self.kommentar,
            "clustername" => &mut self.clustername,
            "itsmBusinessService" => &mut self.itsm_business_service,
            "lebenszyklus" => &mut self.lebenszyklus,
            "supportEnde" => &mut self.support_ende,
            "anzeigename" => &mut self.anzeigename,
            "ccUndMem" => &mut self.cc_und_mem,
            "service" => &mut self.service,
            _ => return None,
        };
        Some(value)
    }

    /// Sets a column by wire key. Returns false for unknown keys.
    pub fn set_field(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.field_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Column values in `COLUMNS` order.
    pub fn values(&self) -> impl Iterator<Item = &str> + '_ {
        COLUMNS.iter().filter_map(move |c| self.field(c.key))
    }

    pub fn has_name(&self) -> bool {
        !self.server_name.trim().is_empty()
    }

    /// A patch carrying the identifier and every column of this record.
    pub fn to_patch(&self) -> ServerPatch {
        ServerPatch {
            id: self.id,
            fields: COLUMNS
                .iter()
                .filter_map(|c| self.field(c.key).map(|v| (c.key.to_string(), v.to_string())))
                .collect(),
        }
    }
}

/// Partial update body: only supplied fields overwrite stored ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Supplied columns keyed by wire name. Unknown keys are ignored on apply.
    /// Scalar values are taken as text, as in `ServerRecord`.
    #[serde(flatten, deserialize_with = "scalar_text_map")]
    pub fields: BTreeMap<String, String>,
}

impl ServerPatch {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.fields.is_empty()
    }

    /// Shallow merge onto `record`.
    pub fn apply(self, record: &mut ServerRecord) {
        if let Some(id) = self.id {
            record.id = Some(id);
        }
        for (key, value) in self.fields {
            record.set_field(&key, value);
        }
    }
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarText;

    impl<'de> Visitor<'de> for ScalarText {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or scalar value")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<String, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(ScalarText)
        }
    }

    deserializer.deserialize_any(ScalarText)
}

struct Text(String);

impl<'de> Deserialize<'de> for Text {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_text(deserializer).map(Text)
    }
}

fn scalar_text_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Text>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(key, Text(value))| (key, value)).collect())
}

// =====================================================
// HTTP Request / Response Types
// =====================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(rename = "yamlData")]
    pub yaml_data: String,
}

/// Confirmation and error body used by the mutation endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub record_count: usize,
}
