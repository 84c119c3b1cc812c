//! Path resolution and backup-on-overwrite

use scaffold_schema::{ArtifactWriter, EntityModel, FileType, OutputLayout, ScaffoldError, Table};
use std::fs;
use tempfile::TempDir;

fn model(table: &str) -> EntityModel {
    EntityModel::build(&Table::new(table, "public"), &[], false)
}

#[test]
fn default_layout_groups_by_table() {
    let layout = OutputLayout::new("/srv/project/apis", FileType::Yaml);
    let path = layout.resolve(&model("Users"), "entity_new").expect("resolve");
    assert_eq!(path.to_str(), Some("/srv/project/apis/users/user_new.yaml"));
}

#[test]
fn custom_layout_tokens() {
    let layout = OutputLayout::new("/srv/apis", FileType::Json).with_path_template("v1/[entity]");
    let path = layout.resolve(&model("categories"), "entity_list").expect("resolve");
    assert_eq!(path.to_str(), Some("/srv/apis/v1/category/category_list.json"));
}

#[test]
fn traversal_is_rejected() {
    let layout = OutputLayout::new("/srv/apis", FileType::Yaml).with_path_template("[rootprj]/../[table]");
    match layout.resolve(&model("users"), "entity_get") {
        Err(ScaffoldError::PathTraversal { root, .. }) => assert_eq!(root.to_str(), Some("/srv/apis")),
        other => panic!("expected traversal error, got {:?}", other),
    }

    let escaping_table = model("../../etc");
    let layout = OutputLayout::new("/srv/apis", FileType::Yaml);
    assert!(layout.resolve(&escaping_table, "entity_get").is_err());
}

#[test]
fn current_directory_root_still_contains_paths() {
    for root in [".", "./", ""] {
        let layout = OutputLayout::new(root, FileType::Yaml);
        let path = layout.resolve(&model("users"), "entity_get").expect("resolve");
        assert_eq!(path.to_str(), Some("users/user_get.yaml"), "root: {:?}", root);

        let escaping = layout.clone().with_path_template("[rootprj]/../escape");
        assert!(
            matches!(
                escaping.resolve(&model("users"), "entity_get"),
                Err(ScaffoldError::PathTraversal { .. })
            ),
            "root: {:?}",
            root
        );

        assert!(layout.resolve(&model(".."), "entity_get").is_err(), "root: {:?}", root);
    }
}

#[test]
fn first_write_has_no_backup() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("users").join("user_get.yaml");

    let result = ArtifactWriter::new().write(&path, "a: 1\n").expect("write");
    assert_eq!(result.backup, None);
    assert_eq!(result.bytes, 5);
    assert_eq!(fs::read_to_string(&path).expect("read"), "a: 1\n");
}

#[test]
fn overwrite_keeps_previous_version() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("user_get.yaml");
    let writer = ArtifactWriter::new();

    writer.write(&path, "old").expect("first write");
    let result = writer.write(&path, "new").expect("second write");

    let backup = result.backup.expect("backup path");
    assert_eq!(fs::read_to_string(&backup).expect("read backup"), "old");
    assert_eq!(fs::read_to_string(&path).expect("read"), "new");

    let name = backup.file_name().and_then(|n| n.to_str()).expect("file name");
    assert!(name.starts_with("user_get.yaml."));
    assert!(name.ends_with(".bak"));
}

#[test]
fn backups_never_collide() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("user_get.yaml");
    let writer = ArtifactWriter::new();

    writer.write(&path, "v1").expect("write v1");
    let second = writer.write(&path, "v2").expect("write v2");
    let third = writer.write(&path, "v3").expect("write v3");

    let (second, third) = (second.backup.expect("backup"), third.backup.expect("backup"));
    assert_ne!(second, third);
    assert_eq!(fs::read_to_string(second).expect("read"), "v1");
    assert_eq!(fs::read_to_string(third).expect("read"), "v2");
}
