//! End-to-end generation runs against a temporary project

use scaffold_schema::{
    Column, FileType, ForeignKey, GenerationRequest, GenerationStatus, Generator, Selection,
    Table,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn tables() -> Vec<Table> {
    vec![
        Table::new("users", "public")
            .column(Column::new("id", "integer").not_null())
            .column(Column::new("email", "varchar").not_null())
            .primary_key("id"),
        Table::new("posts", "public")
            .column(Column::new("id", "integer").not_null())
            .column(Column::new("user_id", "integer").not_null())
            .column(Column::new("title", "varchar"))
            .primary_key("id")
            .foreign_key(ForeignKey::new("user_id", "users", "id")),
    ]
}

fn project() -> (TempDir, Generator, GenerationRequest) {
    let dir = TempDir::new().expect("tempdir");
    let generator = Generator::new(dir.path().join("templates"));
    let request = GenerationRequest::new(dir.path().join("apis"));
    (dir, generator, request)
}

fn statuses(report: &scaffold_schema::GenerationReport) -> Vec<GenerationStatus> {
    report.results.iter().map(|r| r.status).collect()
}

#[test]
fn fresh_project_generates_every_pair() {
    let (dir, generator, request) = project();
    let report = generator.run(&tables(), &request);

    assert_eq!(report.results.len(), 10);
    assert!(!report.has_failures());
    assert_eq!(report.count(GenerationStatus::Written), 10);

    let apis = dir.path().join("apis");
    for file in ["user_new", "user_update", "user_delete", "user_list", "user_get"] {
        assert!(apis.join("users").join(format!("{}.yaml", file)).is_file(), "{}", file);
    }
    assert!(apis.join("posts").join("post_get.yaml").is_file());

    // defaults were copied into the project on first use
    assert!(dir.path().join("templates").join("entity_get.hbs").is_file());
}

#[test]
fn results_follow_table_then_template_order() {
    let (_dir, generator, request) = project();
    let request = request.with_templates(["entity_get", "entity_list"]);
    let report = generator.run(&tables(), &request);

    let pairs: Vec<(&str, &str)> = report
        .results
        .iter()
        .map(|r| (r.table.as_str(), r.template.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("users", "entity_get"),
            ("users", "entity_list"),
            ("posts", "entity_get"),
            ("posts", "entity_list"),
        ]
    );
}

#[test]
fn second_run_backs_up_previous_artifacts() {
    let (_dir, generator, request) = project();
    let request = request.with_templates(["entity_get"]);

    let first = generator.run(&tables(), &request);
    assert!(first.results.iter().all(|r| r.backup.is_none()));

    let second = generator.run(&tables(), &request);
    for result in &second.results {
        assert_eq!(result.status, GenerationStatus::Written);
        let backup = result.backup.as_ref().expect("backup");
        assert_eq!(
            fs::read_to_string(backup).expect("backup content"),
            fs::read_to_string(&result.path).expect("new content")
        );
    }
}

#[test]
fn table_filter_and_missing_tables() {
    let (_dir, generator, request) = project();
    let request = request
        .with_tables(Selection::parse("posts, ghosts"))
        .with_templates(["entity_get"]);
    let report = generator.run(&tables(), &request);

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[0].table, "posts");
    assert_eq!(report.results[0].status, GenerationStatus::Written);
    assert_eq!(report.results[1].table, "ghosts");
    assert_eq!(report.results[1].status, GenerationStatus::Failed);
    assert!(report.results[1].message.contains("not found"));
    assert!(report.has_failures());
}

#[test]
fn relations_follow_the_relation_selection() {
    let (_dir, generator, request) = project();
    let request = request
        .with_relations(Selection::parse_relations("users"))
        .with_templates(["entity_get"]);
    let report = generator.run(&tables(), &request);

    let users = fs::read_to_string(&report.results[0].path).expect("users artifact");
    let posts = fs::read_to_string(&report.results[1].path).expect("posts artifact");
    assert!(users.contains("includes:"));
    assert!(!posts.contains("includes:"));
}

#[test]
fn broken_template_fails_only_its_own_pairs() {
    let (dir, generator, request) = project();
    let templates = dir.path().join("templates");
    fs::create_dir_all(&templates).expect("template dir");
    fs::write(templates.join("entity_broken.hbs"), "{{#each fields}}").expect("write template");

    let request = request.with_templates(["entity_get", "entity_broken", "entity_missing"]);
    let report = generator.run(&tables(), &request);

    assert_eq!(
        statuses(&report),
        vec![
            GenerationStatus::Written,
            GenerationStatus::Failed,
            GenerationStatus::Failed,
            GenerationStatus::Written,
            GenerationStatus::Failed,
            GenerationStatus::Failed,
        ]
    );
    assert!(report.results[1].message.contains("entity_broken"));
    assert!(report.results[2].message.contains("not found"));
    assert!(!report.results[1].path.exists());
}

#[test]
fn escaping_path_template_writes_nothing() {
    let (dir, generator, request) = project();
    let request = request
        .with_path_template("[rootprj]/../outside")
        .with_templates(["entity_get"]);
    let report = generator.run(&tables(), &request);

    assert_eq!(report.count(GenerationStatus::Failed), 2);
    assert!(report.results.iter().all(|r| r.message.contains("escapes")));
    assert!(!dir.path().join("outside").exists());
}

#[test]
fn custom_file_type_and_layout() {
    let (dir, generator, request) = project();
    let request = request
        .with_file_type(FileType::from("yml"))
        .with_path_template("[rootprj]/v1/[entity]")
        .with_templates(["entity_list"]);
    generator.run(&tables(), &request);

    let expected = dir.path().join("apis/v1/user/user_list.yaml");
    assert!(Path::new(&expected).is_file());
}

#[test]
fn skipped_tables_are_reported_once() {
    let (_dir, generator, request) = project();
    let request = request.with_tables(Selection::parse("users,audit_log"));
    let skipped = vec![
        ("audit_log".to_string(), "permission denied".to_string()),
        ("sessions".to_string(), "permission denied".to_string()),
    ];
    let report = generator.run_with_skipped(&tables(), &skipped, &request);

    assert_eq!(report.count(GenerationStatus::Written), 5);
    assert_eq!(report.count(GenerationStatus::Skipped), 5);
    assert!(!report.has_failures());

    let audit: Vec<_> = report.results.iter().filter(|r| r.table == "audit_log").collect();
    assert_eq!(audit.len(), 5);
    assert!(audit[0].path.ends_with("audit_log/audit_log_new.yaml"));
    assert_eq!(audit[0].message, "permission denied");
}
