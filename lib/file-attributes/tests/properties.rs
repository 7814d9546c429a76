#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use file_attributes::{
    AttributeError, AttributeRegistry, AttributesConfig, FileAttributes, MemoryAttributes,
    Properties, TypeTag, Value, XattrError, properties,
};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

const PREFIX: &str = "com.example.reader";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Bookmark {
    chapter: u32,
    title: String,
}

#[properties(backing = FileAttributes)]
struct ReaderState {
    page: i64,
    zoom: f32,
    scroll: f64,
    finished: bool,
    last_opened: Option<DateTime<Utc>>,
    title: Option<String>,
    thumbnail: Vec<u8>,
    history: Vec<Value>,
    tags: BTreeMap<String, Value>,
    #[property(archive)]
    bookmark: Option<Bookmark>,
    #[property(ignore)]
    dirty: bool,
}

struct Fixture {
    file: NamedTempFile,
    backend: Arc<MemoryAttributes>,
    attributes: Arc<FileAttributes>,
}

impl Fixture {
    fn new(cached: bool) -> Self {
        let file = NamedTempFile::new().unwrap();
        let backend = Arc::new(MemoryAttributes::new());
        let attributes = FileAttributes::with_backend(
            file.path(),
            AttributesConfig::from(PREFIX).with_cached(cached),
            backend.clone(),
        )
        .unwrap();
        Self {
            file,
            backend,
            attributes,
        }
    }

    fn state(&self) -> ReaderState {
        ReaderState::new(self.attributes.clone(), false)
    }

    fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.backend
            .raw(self.attributes.path(), &format!("{PREFIX}.{name}"))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn every_field_roundtrips_through_the_file() {
    init_tracing();
    let fixture = Fixture::new(false);
    let state = fixture.state();

    let opened = Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
    let mut tags = BTreeMap::new();
    tags.insert("a".to_string(), Value::Integer(1));
    tags.insert("b".to_string(), Value::String("two".into()));
    let bookmark = Bookmark {
        chapter: 3,
        title: "Dawn".into(),
    };

    state.set_page(42);
    state.set_zoom(1.5);
    state.set_scroll(0.25);
    state.set_finished(true);
    state.set_last_opened(Some(opened));
    state.set_title(Some("Dune".into()));
    state.set_thumbnail(vec![0xde, 0xad]);
    state.set_history(vec![Value::Integer(1), Value::String("x".into())]);
    state.set_tags(tags.clone());
    state.set_bookmark(Some(bookmark.clone()));

    // A second handle over the same attributes reads what the first wrote.
    let reread = fixture.state();
    assert_eq!(reread.page(), 42);
    assert_eq!(reread.zoom(), 1.5);
    assert_eq!(reread.scroll(), 0.25);
    assert!(reread.finished());
    assert_eq!(reread.last_opened(), Some(opened));
    assert_eq!(reread.title().as_deref(), Some("Dune"));
    assert_eq!(reread.thumbnail(), vec![0xde, 0xad]);
    assert_eq!(
        reread.history(),
        vec![Value::Integer(1), Value::String("x".into())]
    );
    assert_eq!(reread.tags(), tags);
    assert_eq!(reread.bookmark(), Some(bookmark));
    assert!(!reread.dirty);
    assert!(fixture.attributes.latest_error().is_none());
}

#[test]
fn values_use_the_typed_layout() {
    let fixture = Fixture::new(true);
    let state = fixture.state();

    state.set_page(42);
    state.set_zoom(1.5);
    state.set_title(Some("hi".into()));

    assert_eq!(fixture.raw("page"), Some(42i64.to_le_bytes().to_vec()));
    assert_eq!(fixture.raw("zoom"), Some(1.5f32.to_le_bytes().to_vec()));
    assert_eq!(fixture.raw("title"), Some(b"hi".to_vec()));
}

#[test]
fn none_removes_the_attribute() {
    let fixture = Fixture::new(true);
    let state = fixture.state();

    state.set_title(Some("temporary".into()));
    assert!(fixture.raw("title").is_some());

    state.set_title(None);
    assert!(fixture.raw("title").is_none());
    assert_eq!(state.title(), None);
    assert!(
        !fixture
            .attributes
            .attribute_names()
            .contains(&"title".to_string())
    );
}

#[test]
fn cached_reads_skip_the_primitive() {
    let fixture = Fixture::new(true);
    let state = fixture.state();

    state.set_page(7);
    fixture.backend.reset_calls();

    for _ in 0..5 {
        assert_eq!(state.page(), 7);
    }
    assert_eq!(fixture.backend.calls().total(), 0);
}

#[test]
fn first_cached_read_loads_once() {
    let fixture = Fixture::new(true);
    fixture.backend.insert_raw(
        fixture.attributes.path(),
        format!("{PREFIX}.page"),
        9i64.to_le_bytes().to_vec(),
    );
    let state = fixture.state();

    assert_eq!(state.page(), 9);
    assert_eq!(state.page(), 9);
    assert_eq!(fixture.backend.calls().get, 1);
}

#[test]
fn uncached_reads_hit_the_primitive_each_time() {
    let fixture = Fixture::new(false);
    let state = fixture.state();

    state.set_page(7);
    fixture.backend.reset_calls();

    for _ in 0..3 {
        assert_eq!(state.page(), 7);
    }
    assert_eq!(fixture.backend.calls().get, 3);
    assert_eq!(fixture.backend.calls().set, 0);
}

#[test]
fn shared_instances_share_a_cache() {
    let file = NamedTempFile::new().unwrap();
    let backend = Arc::new(MemoryAttributes::new());
    let registry = AttributeRegistry::with_backend(backend.clone());

    let first = registry.shared(file.path()).unwrap();
    let second = registry.shared(file.path()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let writer = ReaderState::new(first, false);
    let reader = ReaderState::new(second, false);
    writer.set_page(11);
    backend.reset_calls();

    assert_eq!(reader.page(), 11);
    assert_eq!(backend.calls().total(), 0);
}

#[test]
fn independent_instances_keep_separate_caches() {
    let file = NamedTempFile::new().unwrap();
    let backend = Arc::new(MemoryAttributes::new());
    let config = AttributesConfig::from(PREFIX);
    let first = FileAttributes::with_backend(file.path(), config.clone(), backend.clone()).unwrap();
    let second = FileAttributes::with_backend(file.path(), config, backend.clone()).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    let a = ReaderState::new(first, false);
    let b = ReaderState::new(second, false);

    a.set_page(1);
    assert_eq!(b.page(), 1);

    // `b` now holds 1 in its cache and does not see `a`'s next write.
    a.set_page(2);
    assert_eq!(a.page(), 2);
    assert_eq!(b.page(), 1);

    b.backing().clear_cache();
    assert_eq!(b.page(), 2);
}

#[test]
fn prefix_isolates_attributes() {
    let fixture = Fixture::new(true);
    let state = fixture.state();
    state.set_page(5);

    fixture
        .attributes
        .set_identifier_prefix(Some("org.other".into()));
    assert_eq!(state.page(), 0);
    assert!(fixture.attributes.attribute_names().is_empty());

    fixture.attributes.set_identifier_prefix(Some(PREFIX.into()));
    assert_eq!(state.page(), 5);
    assert_eq!(fixture.attributes.attribute_names(), vec!["page".to_string()]);
}

#[test]
fn corrupt_attribute_reads_none_without_poisoning() {
    let fixture = Fixture::new(true);
    let state = fixture.state();
    fixture.backend.insert_raw(
        fixture.attributes.path(),
        format!("{PREFIX}.history"),
        b"not an archive".to_vec(),
    );

    assert!(state.history().is_empty());
    match fixture.attributes.latest_error() {
        Some(AttributeError::Decode { key, .. }) => assert_eq!(key, format!("{PREFIX}.history")),
        other => panic!("expected a decode error, got {other:?}"),
    }

    // Other fields are unaffected, and the bad value was not cached.
    state.set_page(3);
    assert_eq!(state.page(), 3);
    fixture.backend.reset_calls();
    assert!(state.history().is_empty());
    assert_eq!(fixture.backend.calls().get, 1);

    state.set_history(vec![Value::Boolean(true)]);
    assert_eq!(state.history(), vec![Value::Boolean(true)]);
    assert!(fixture.attributes.latest_error().is_none());
}

#[test]
fn cached_value_survives_file_deletion() {
    let fixture = Fixture::new(true);
    let state = fixture.state();
    state.set_page(42);

    let Fixture {
        file,
        backend,
        attributes,
    } = fixture;
    file.close().unwrap();
    backend.reset_calls();

    // The cached value still answers, without the primitive, and the missing
    // file is reported alongside it.
    assert_eq!(state.page(), 42);
    assert_eq!(backend.calls().total(), 0);
    let missing = |error: Option<AttributeError>| {
        matches!(
            error,
            Some(AttributeError::Storage {
                source: XattrError::FileMissing,
                ..
            })
        )
    };
    assert!(missing(attributes.latest_error()));

    state.set_page(43);
    assert!(missing(attributes.latest_error()));
    assert_eq!(state.page(), 42);
    assert!(missing(attributes.latest_error()));
    assert_eq!(backend.calls().set, 1);
}

#[test]
fn uncached_read_after_deletion_reports_storage_error() {
    let fixture = Fixture::new(false);
    let state = fixture.state();
    state.set_page(42);

    let Fixture {
        file, attributes, ..
    } = fixture;
    file.close().unwrap();

    assert_eq!(state.page(), 0);
    let error = attributes.latest_error().unwrap();
    assert!(matches!(
        error,
        AttributeError::Storage {
            source: XattrError::FileMissing,
            ..
        }
    ));
    assert_eq!(error.key(), format!("{PREFIX}.page"));
}

#[test]
fn failed_write_leaves_previous_value() {
    let fixture = Fixture::new(true);
    let state = fixture.state();
    state.set_page(1);

    fixture.backend.set_failure(Some(XattrError::NoSpace));
    state.set_page(2);
    fixture.backend.set_failure(None);

    assert_eq!(state.page(), 1);
    assert_eq!(fixture.raw("page"), Some(1i64.to_le_bytes().to_vec()));
}

#[test]
fn unsupported_volume_is_reported() {
    let fixture = Fixture::new(true);
    fixture.backend.set_failure(Some(XattrError::Unsupported));
    let state = fixture.state();

    assert_eq!(state.title(), None);
    assert!(fixture.attributes.latest_error().unwrap().is_unsupported());
}

#[test]
fn subscript_access_uses_declared_types() {
    let fixture = Fixture::new(true);
    let state = fixture.state();

    state.set("page", Some(Value::Integer(12)));
    assert_eq!(state.page(), 12);
    assert_eq!(
        ReaderState::descriptor("page").map(|d| d.declared_type),
        Some(TypeTag::Integer)
    );

    state.set("annotation", Some(Value::String("free form".into())));
    assert_eq!(
        state.get("annotation"),
        Some(Value::String("free form".into()))
    );
    assert!(fixture.raw("annotation").unwrap().starts_with(b"FATR"));
}
