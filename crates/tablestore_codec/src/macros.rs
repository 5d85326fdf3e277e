//! Declarative `TableEntity` implementations.

/// Implements [`TableEntity`](crate::TableEntity) for a record type.
///
/// Each line names the mapping kind, the field, and its column name:
/// - `native` fields are stored verbatim under the column name
/// - `json` fields are stored as JSON text under `__jsonFor_<column>`
///
/// Listed fields are mapped in both directions. Fields that are not listed
/// are never written and never populated.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use tablestore_codec::{table_entity, EntityCodec};
///
/// #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
/// struct Owner {
///     name: String,
/// }
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Vehicle {
///     plate_no: String,
///     city: String,
///     owner: Owner,
/// }
///
/// table_entity!(Vehicle {
///     native plate_no => "PlateNo",
///     native city => "City",
///     json owner => "Owner",
/// });
///
/// let props = EntityCodec::encode(&Vehicle::default()).unwrap();
/// assert!(props.contains_key("PlateNo"));
/// assert!(props.contains_key("__jsonFor_Owner"));
/// ```
#[macro_export]
macro_rules! table_entity {
    (@write native, $columns:ident, $column:expr, $value:expr) => {
        $columns.native($column, $value);
    };
    (@write json, $columns:ident, $column:expr, $value:expr) => {
        $columns.json($column, $value)?;
    };
    (@read native, $columns:ident, $column:expr, $value:expr) => {
        $columns.native($column, $value);
    };
    (@read json, $columns:ident, $column:expr, $value:expr) => {
        $columns.json($column, $value)?;
    };
    ($ty:ty { $($kind:ident $field:ident => $column:expr),* $(,)? }) => {
        impl $crate::TableEntity for $ty {
            #[allow(unused_variables)]
            fn write_columns(
                &self,
                columns: &mut $crate::ColumnWriter,
            ) -> $crate::CodecResult<()> {
                $( $crate::table_entity!(@write $kind, columns, $column, &self.$field); )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn read_columns(
                &mut self,
                columns: &$crate::ColumnReader<'_>,
            ) -> $crate::CodecResult<()> {
                $( $crate::table_entity!(@read $kind, columns, $column, &mut self.$field); )*
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{EdmValue, EntityCodec, NativeEntity};
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct Owner {
        name: String,
        licensed: bool,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Vehicle {
        plate_no: String,
        city: String,
        seats: i32,
        owner: Owner,
        mileage: BTreeMap<String, u64>,
        note: String,
    }

    table_entity!(Vehicle {
        native plate_no => "PlateNo",
        native city => "City",
        native seats => "Seats",
        json owner => "Owner",
        json mileage => "Mileage",
    });

    #[derive(Debug, Default, PartialEq)]
    struct Empty;

    table_entity!(Empty {});

    fn vehicle() -> Vehicle {
        let mut mileage = BTreeMap::new();
        mileage.insert("2023".to_string(), 12_000);
        Vehicle {
            plate_no: "ABC123".into(),
            city: "Westview".into(),
            seats: 5,
            owner: Owner {
                name: "Dana".into(),
                licensed: true,
            },
            mileage,
            note: String::new(),
        }
    }

    #[test]
    fn macro_roundtrip() {
        let vehicle = vehicle();
        let entity = EntityCodec::to_entity(&vehicle, "Westview", "ABC123").unwrap();
        let decoded: Vehicle = EntityCodec::decode(&entity).unwrap();
        assert_eq!(decoded, vehicle);
    }

    #[test]
    fn unlisted_field_is_not_written() {
        let vehicle = Vehicle {
            note: "private".into(),
            ..vehicle()
        };
        let props = EntityCodec::encode(&vehicle).unwrap();
        assert!(!props.contains_key("note"));
        assert!(!props.contains_key("Note"));
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn unlisted_field_is_not_populated() {
        let mut entity = NativeEntity::new("p", "r");
        entity.insert("note", "from the store");
        entity.insert("Seats", EdmValue::Int32(2));
        let decoded: Vehicle = EntityCodec::decode(&entity).unwrap();
        assert_eq!(decoded.note, "");
        assert_eq!(decoded.seats, 2);
    }

    #[test]
    fn empty_record() {
        assert!(EntityCodec::encode(&Empty).unwrap().is_empty());
        let decoded: Empty = EntityCodec::decode(&NativeEntity::new("p", "r")).unwrap();
        assert_eq!(decoded, Empty);
    }
}
