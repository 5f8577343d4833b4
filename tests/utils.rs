use metasniff::data::{FileRecord, RemoteEntry};
use metasniff::error::ConfigError;
use metasniff::utils::{
    format_optional_size, format_timestamp, normalize_folder_reference, sort_records,
};

#[test]
fn test_bare_folder_id_passes_through() {
    assert_eq!(
        normalize_folder_reference("1AbCdEf_-xyz").unwrap(),
        "1AbCdEf_-xyz"
    );
    assert_eq!(normalize_folder_reference("  abc  ").unwrap(), "abc");
}

#[test]
fn test_shared_link_shapes() {
    let cases = [
        (
            "https://drive.google.com/drive/folders/1AbC_d-9?usp=sharing",
            "1AbC_d-9",
        ),
        ("https://drive.google.com/drive/u/0/folders/XyZ", "XyZ"),
        ("https://drive.google.com/open?id=Q1w2E3", "Q1w2E3"),
        (
            "https://drive.google.com/folderview?usp=sharing&id=Zz9",
            "Zz9",
        ),
    ];
    for (link, expected) in cases {
        assert_eq!(normalize_folder_reference(link).unwrap(), expected, "{link}");
    }
}

#[test]
fn test_unrecognised_references_rejected() {
    for bad in ["", "https://example.com/some/page", "folder/with/slashes"] {
        assert!(matches!(
            normalize_folder_reference(bad),
            Err(ConfigError::InvalidFolderReference(_))
        ));
    }
}

#[test]
fn test_sort_records_by_id() {
    let mut records: Vec<FileRecord> = ["b", "c", "a"]
        .iter()
        .map(|id| {
            FileRecord::from_entry(
                RemoteEntry {
                    id: id.to_string(),
                    ..Default::default()
                },
                format!("Root/{id}"),
            )
        })
        .collect();

    sort_records(&mut records);
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn test_format_timestamp() {
    assert_eq!(
        format_timestamp(Some("2023-11-05T14:03:22.123Z")),
        "2023-11-05 14:03:22 UTC"
    );
    assert_eq!(
        format_timestamp(Some("2023-11-05T16:03:22+02:00")),
        "2023-11-05 14:03:22 UTC"
    );
    assert_eq!(format_timestamp(Some("yesterday")), "yesterday");
    assert_eq!(format_timestamp(None), "N/A");
}

#[test]
fn test_format_optional_size() {
    assert_eq!(format_optional_size(None), "N/A");
    assert_eq!(format_optional_size(Some(200)), "200 B");
    assert_eq!(format_optional_size(Some(1_500_000)), "1.50 MB");
}
