use crate::db::DbError;

/// Staging header field -> destination column, in staging column order
pub const COLUMN_MAPPING: [(&str, &str); 6] = [
    ("mon", "mon"),
    ("year", "yr"),
    ("daytype", "daytype"),
    ("Entry stations", "start"),
    ("Exit stations", "term"),
    ("riders", "riders"),
];

/// Destination column for a staging header field
pub fn destination_for(source_field: &str) -> Option<&'static str> {
    COLUMN_MAPPING
        .iter()
        .find(|(source, _)| *source == source_field)
        .map(|(_, destination)| *destination)
}

/// Destination columns in the order the staging header declares them
pub fn destination_columns<S: AsRef<str>>(header: &[S]) -> Result<Vec<&'static str>, DbError> {
    header
        .iter()
        .map(|field| {
            destination_for(field.as_ref())
                .ok_or_else(|| DbError::UnmappedColumn(field.as_ref().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::staging::STAGING_HEADER;

    #[test]
    fn test_entry_stations_maps_to_start() {
        assert_eq!(destination_for("Entry stations"), Some("start"));
        assert_eq!(destination_for("Exit stations"), Some("term"));
        assert_eq!(destination_for("year"), Some("yr"));
    }

    #[test]
    fn test_record_field_names_are_not_mapped() {
        assert_eq!(destination_for("entry_station"), None);
        assert_eq!(destination_for("start"), None);
    }

    #[test]
    fn test_staging_header_is_fully_mapped() {
        let columns = destination_columns(&STAGING_HEADER).unwrap();
        assert_eq!(columns, vec!["mon", "yr", "daytype", "start", "term", "riders"]);
    }

    #[test]
    fn test_header_order_is_preserved() {
        let columns = destination_columns(&["riders", "Exit stations", "mon"]).unwrap();
        assert_eq!(columns, vec!["riders", "term", "mon"]);
    }

    #[test]
    fn test_unknown_header_field() {
        let result = destination_columns(&["mon", "Entry station"]);
        assert!(matches!(result, Err(DbError::UnmappedColumn(f)) if f == "Entry station"));
    }
}
