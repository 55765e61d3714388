use hyperknow_pipeline::{article_filename, ArticleMeta, ArticleStore, StoreError};

fn meta() -> ArticleMeta {
    ArticleMeta {
        topic: "Neural Networks".to_string(),
        conversation_id: "abc123".to_string(),
        generated_utc: "2025-01-15T10:00:00Z".to_string(),
        word_count: 3,
    }
}

#[test]
fn saved_article_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ArticleStore::new(dir.path().to_path_buf());

    let saved = store.save(&meta(), "# Intro\n\nMore text").expect("save");
    assert_eq!(saved.filename, article_filename("Neural Networks", "abc123"));
    assert!(saved.path.exists());

    let (loaded_meta, body) = store.load(&saved.filename).expect("load");
    assert_eq!(loaded_meta, meta());
    assert_eq!(body, "# Intro\n\nMore text");
}

#[test]
fn save_replaces_an_existing_article() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ArticleStore::new(dir.path().to_path_buf());

    store.save(&meta(), "first draft").expect("save");
    let saved = store.save(&meta(), "final text").expect("save again");
    let (_, body) = store.load(&saved.filename).expect("load");
    assert_eq!(body, "final text");
}

#[test]
fn store_creates_its_directory_on_demand() {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("archive").join("articles");
    let store = ArticleStore::new(nested.clone());

    store.save(&meta(), "content").expect("save");
    assert!(nested.is_dir());
}

#[test]
fn loading_a_file_without_frontmatter_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("bare.md"), "no frontmatter here").expect("write");

    let store = ArticleStore::new(dir.path().to_path_buf());
    match store.load("bare.md") {
        Err(StoreError::MissingFrontmatter(name)) => assert_eq!(name, "bare.md"),
        other => panic!("unexpected result {other:?}"),
    }
}
