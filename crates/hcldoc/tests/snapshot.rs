//! Snapshot tests
//!
//! Loads each *.hcl file in /tests/ individually and compares if the
//! reduced document (rendered as pretty json) changes.

#[test]
fn snapshots() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("HCLDOC_LOG"))
        .with_writer(std::io::stderr)
        .init();

    insta::glob!("*.hcl", |path| {
        let document = hcldoc::load_file(path, hcldoc::Recovery::Strict).expect("must be a valid document");
        let rendered = serde_json::to_string_pretty(&document).expect("serializable");

        insta::assert_snapshot!(rendered);
    });
}
