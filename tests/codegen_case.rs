mod common;

use common::init_tracing;
use linetmpl::{Engine, Rendered};

const MODEL_TEMPLATE: &str = r#"---
derives: ['Debug', 'Clone', 'PartialEq']
---
:// Generates one Rust struct per entity.
:func field(f)
:set-str ty = {{ f.ty }}
:if f.optional
:set-str ty = Option<{{ f.ty }}>
:end-if
:if f.doc
    /// {{ f.doc }}
:end-if
    pub {{ f.name | lowercase }}: {{ ty }},
:end-func
:if entity.skip
:exclude-file
:end-if
#[derive({{ derives | join(', ') }})]
pub struct {{ entity.name | capitalize }} {
:for f in entity.fields
:call field(f: f)
:end-for
}
:if entity.fields.count > 0
:spaceless

impl {{ entity.name | capitalize }} {
    pub const FIELDS: usize = {{ entity.fields.count }};
}
:end-spaceless

:end-if
"#;

fn entity(json: serde_json::Value) -> Rendered {
    init_tracing();
    Engine::new()
        .render_json("model.tmpl", MODEL_TEMPLATE, serde_json::json!({ "entity": json }))
        .unwrap()
}

#[test]
fn test_struct_with_optional_and_documented_fields() {
    let rendered = entity(serde_json::json!({
        "name": "invoice",
        "fields": [
            { "name": "Id", "ty": "u64", "doc": "Primary key." },
            { "name": "total", "ty": "f64" },
            { "name": "note", "ty": "String", "optional": true }
        ]
    }));
    let out = rendered.into_text().unwrap();
    insta::assert_snapshot!(out, @r"
    #[derive(Debug, Clone, PartialEq)]
    pub struct Invoice {
        /// Primary key.
        pub id: u64,
        pub total: f64,
        pub note: Option<String>,
    }
    impl Invoice { pub const FIELDS: usize = 3; }
    ");
}

#[test]
fn test_struct_without_fields() {
    let rendered = entity(serde_json::json!({ "name": "marker", "fields": [] }));
    assert_eq!(
        rendered.text(),
        Some("#[derive(Debug, Clone, PartialEq)]\npub struct Marker {\n}\n")
    );
}

#[test]
fn test_skipped_entity_is_excluded() {
    let rendered = entity(serde_json::json!({ "name": "legacy", "skip": true, "fields": [] }));
    assert_eq!(rendered, Rendered::Excluded);
}

#[test]
fn test_template_is_reusable() {
    init_tracing();
    let engine = Engine::new();
    let template = engine.parse("model.tmpl", MODEL_TEMPLATE).unwrap();
    let data = serde_json::json!({ "entity": { "name": "tag", "fields": [{ "name": "label", "ty": "String" }] } });

    let first = template
        .render(&engine, linetmpl::variables_from_json(data.clone()))
        .unwrap();
    let second = template
        .render(&engine, linetmpl::variables_from_json(data))
        .unwrap();
    assert_eq!(first, second);
    assert!(first.text().unwrap().contains("pub label: String,"));
}
