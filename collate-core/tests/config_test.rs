use collate_core::config::*;

#[test]
fn config_loads_from_empty_toml_with_all_defaults() {
    let config = CollateConfig::from_toml("").unwrap();

    // Corpus defaults
    assert!(config.corpus.collections.is_empty());
    assert!(config.corpus.include.is_empty());
    assert_eq!(config.corpus.max_file_size, 268_435_456);
    assert_eq!(config.corpus.threads, 0);
    assert!(!config.corpus.follow_symlinks);

    // Cluster defaults
    assert_eq!(config.cluster.similarity_threshold, 0.80);
    assert_eq!(
        config.cluster.collection_priority,
        vec!["court-records", "agency-release", "estate-archive", "press-scan"]
    );

    // Entity defaults
    assert!(config.entities.alias_seed_path.is_none());
    assert_eq!(config.entities.max_edit_distance, 2);
    assert_eq!(config.entities.jaro_winkler_floor, 0.90);

    // Storage defaults
    assert_eq!(config.storage.db_path, "collate.db");
    assert!(config.storage.wal_mode);
    assert_eq!(config.storage.mmap_size, 268_435_456);
    assert_eq!(config.storage.cache_size, -64_000);
    assert_eq!(config.storage.busy_timeout_ms, 5_000);
    assert_eq!(config.storage.read_pool_size, 4);
}

#[test]
fn config_loads_partial_toml_with_overrides() {
    let toml = r#"
[storage]
db_path = "/custom/path.db"
read_pool_size = 8

[cluster]
similarity_threshold = 0.9

[[corpus.collections]]
name = "court-records"
path = "/data/court"
"#;
    let config = CollateConfig::from_toml(toml).unwrap();
    assert_eq!(config.storage.db_path, "/custom/path.db");
    assert_eq!(config.storage.read_pool_size, 8);
    assert_eq!(config.cluster.similarity_threshold, 0.9);
    assert_eq!(config.corpus.collections.len(), 1);
    assert_eq!(config.corpus.collections[0].name, "court-records");
    // Non-overridden fields keep defaults
    assert!(config.storage.wal_mode);
    assert_eq!(config.entities.max_edit_distance, 2);
}

#[test]
fn config_rejects_out_of_range_threshold() {
    let toml = r#"
[cluster]
similarity_threshold = 1.5
"#;
    assert!(CollateConfig::from_toml(toml).is_err());
}

#[test]
fn config_serde_roundtrip() {
    let config = CollateConfig::default();
    let toml_str = toml::to_string(&config).unwrap();
    let roundtripped = CollateConfig::from_toml(&toml_str).unwrap();
    assert_eq!(roundtripped.storage.db_path, config.storage.db_path);
    assert_eq!(
        roundtripped.cluster.similarity_threshold,
        config.cluster.similarity_threshold
    );
}
