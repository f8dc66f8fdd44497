use std::{fmt, ops::Deref, str::FromStr};

use chrono::{DateTime, SubsecRound, Utc};

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

/// The current time, truncated to the millisecond precision of BSON datetimes
/// so that stored timestamps read back unchanged.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A database ID, used for every entity in the system.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id(ObjectId);

impl Id {
    /// Generate a fresh ID.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// A filter document matching this ID.
    pub fn as_doc(&self) -> Document {
        doc! { "_id": self.0 }
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Id {
    type Target = ObjectId;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = mongodb::bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<ObjectId>()?))
    }
}

impl From<ObjectId> for Id {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl From<Id> for Bson {
    fn from(id: Id) -> Self {
        Bson::ObjectId(id.0)
    }
}

impl<'a> FromParam<'a> for Id {
    type Error = mongodb::bson::oid::Error;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse::<Id>()
    }
}

impl UriDisplay<Path> for Id {
    fn fmt(&self, formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>) -> fmt::Result {
        formatter.write_value(self.to_string())
    }
}

impl_from_uri_param_identity!([Path] Id);

/// Serialise IDs as plain hex strings in API-facing types, rather than
/// MongoDB's extended JSON `{"$oid": ...}` form.
pub mod serde_id_hex {
    use super::*;

    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Id, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Id, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(de::Error::custom)
    }

    /// The same, for optional IDs.
    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(id: &Option<Id>, serializer: S) -> Result<S::Ok, S::Error> {
            match id {
                Some(id) => serializer.serialize_some(&id.to_hex()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Id>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|hex| hex.parse().map_err(de::Error::custom))
                .transpose()
        }
    }

    /// The same, for lists of IDs.
    pub mod vec {
        use super::*;

        use serde::ser::SerializeSeq;

        pub fn serialize<S: Serializer>(ids: &[Id], serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(ids.len()))?;
            for id in ids {
                seq.serialize_element(&id.to_hex())?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Id>, D::Error> {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|hex| hex.parse().map_err(de::Error::custom))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rocket::serde::json::serde_json;

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "serde_id_hex")]
        id: Id,
        #[serde(with = "serde_id_hex::option")]
        other: Option<Id>,
        #[serde(with = "serde_id_hex::vec")]
        many: Vec<Id>,
    }

    #[test]
    fn ids_are_plain_hex_in_json() {
        let id: Id = "64b7f0c2a1b2c3d4e5f60718".parse().unwrap();
        let json = serde_json::to_value(Wrapper {
            id,
            other: None,
            many: vec![id, id],
        })
        .unwrap();
        assert_eq!(json["id"], "64b7f0c2a1b2c3d4e5f60718");
        assert!(json["other"].is_null());
        assert_eq!(json["many"][1], "64b7f0c2a1b2c3d4e5f60718");

        let back: Wrapper = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, id);
        assert_eq!(back.other, None);
        assert_eq!(back.many, vec![id, id]);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        let json = serde_json::json!({"id": "nope", "other": null, "many": []});
        assert!(serde_json::from_value::<Wrapper>(json).is_err());
    }

    #[test]
    fn bad_id_param_is_rejected() {
        assert!(Id::from_param("not-an-id").is_err());
        assert!(Id::from_param("64b7f0c2a1b2c3d4e5f60718").is_ok());
    }
}
