/// Esri field definitions for the business point layer.
pub mod esri {
    use std::collections::BTreeSet;

    use serde::Serialize;

    use crate::normalize::KeepKeys;
    use crate::spatial::cell_field_name;

    /// Object id field every feature carries.
    pub const OBJECT_ID_FIELD: &str = "OBJECTID";

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub enum FieldType {
        #[serde(rename = "esriFieldTypeOID")]
        Oid,
        #[serde(rename = "esriFieldTypeString")]
        String,
        #[serde(rename = "esriFieldTypeInteger")]
        Integer,
        #[serde(rename = "esriFieldTypeDouble")]
        Double,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct Field {
        pub name: String,
        #[serde(rename = "type")]
        pub field_type: FieldType,
        pub alias: String,
    }

    impl Field {
        fn new(name: impl Into<String>, field_type: FieldType) -> Self {
            let name = name.into();
            Self {
                alias: name.clone(),
                name,
                field_type,
            }
        }
    }

    /// Attribute type for a display field; anything unknown is a string.
    pub fn field_type(name: &str) -> FieldType {
        match name {
            "review_count" => FieldType::Integer,
            "rating" | "distance" => FieldType::Double,
            _ => FieldType::String,
        }
    }

    /// Field list for the layer: object id, the kept display fields, then one
    /// string field per H3 resolution.
    pub fn business_fields(keep_keys: &KeepKeys, resolutions: &BTreeSet<u8>) -> Vec<Field> {
        let mut fields = vec![Field::new(OBJECT_ID_FIELD, FieldType::Oid)];
        fields.extend(
            keep_keys
                .iter()
                .filter(|&k| k != "geometry")
                .map(|k| Field::new(k, field_type(k))),
        );
        fields.extend(
            resolutions
                .iter()
                .map(|&res| Field::new(cell_field_name(res), FieldType::String)),
        );
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::esri;
    use crate::normalize::KeepKeys;
    use std::collections::BTreeSet;

    #[test]
    fn business_fields_have_expected_shape() {
        let fields = esri::business_fields(&KeepKeys::default(), &BTreeSet::from([9, 10]));
        assert_eq!(fields.len(), 1 + 9 + 2);
        assert_eq!(fields[0].name, esri::OBJECT_ID_FIELD);
        assert_eq!(fields[0].field_type, esri::FieldType::Oid);
        assert_eq!(fields.last().unwrap().name, "h3_10");

        let rating = fields.iter().find(|f| f.name == "rating").unwrap();
        assert_eq!(rating.field_type, esri::FieldType::Double);
    }

    #[test]
    fn field_serializes_with_esri_type_names() {
        let fields = esri::business_fields(&["review_count"].into_iter().collect(), &BTreeSet::new());
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json[1]["type"], "esriFieldTypeInteger");
        assert_eq!(json[1]["alias"], "review_count");
    }
}
