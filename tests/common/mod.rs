#![allow(dead_code)]

use std::sync::Once;

use linetmpl::{Engine, Rendered, RenderError, Value, Variables};

static INIT: Once = Once::new();

/// Installs a test-writer tracing subscriber once per test binary.
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("linetmpl=debug")),
            )
            .with_target(false)
            .init();
    });
}

pub fn vars<const N: usize>(entries: [(&str, Value); N]) -> Variables {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub fn render(text: &str, vars: Variables) -> Result<Rendered, RenderError> {
    init_tracing();
    Engine::new().render("test.tmpl", text, vars)
}

/// Renders and unwraps the text outcome.
pub fn render_text(text: &str, vars: Variables) -> String {
    match render(text, vars) {
        Ok(Rendered::Text(out)) => out,
        other => panic!("expected text output, got {other:?}"),
    }
}
