use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A single author record as handed out by the repositories.
///
/// JSON shape is fixed: `{"id":..,"firstName":..,"lastName":..,"yearOfBirth":..}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub year_of_birth: i32,
}

impl Author {
    pub fn new<F, L>(id: i64, first_name: F, last_name: L, year_of_birth: i32) -> Self
    where
        F: Into<String>,
        L: Into<String>,
    {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            year_of_birth,
        }
    }
}

impl Serialize for Author {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Author", 4)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("firstName", &self.first_name)?;
        state.serialize_field("lastName", &self.last_name)?;
        state.serialize_field("yearOfBirth", &self.year_of_birth)?;
        state.end()
    }
}
