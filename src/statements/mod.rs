//! Built-in statements.

pub mod call;
pub mod content;
pub mod directives;
pub mod for_loop;
pub mod if_else;
pub mod set;
pub mod spaceless;
pub mod verbatim;

use crate::parser::{Continuation, StatementRegistry, StatementSyntax};

pub fn register_defaults(registry: &mut StatementRegistry) {
    registry.register(
        "if",
        StatementSyntax::MultiBlock {
            end: "end-if".into(),
            continuations: vec![
                Continuation {
                    keyword: "elseif".into(),
                    repeatable: true,
                    closes_chain: false,
                },
                Continuation {
                    keyword: "else".into(),
                    repeatable: false,
                    closes_chain: true,
                },
            ],
            build: if_else::build,
        },
    );
    registry.register(
        "for",
        StatementSyntax::Block {
            end: "end-for".into(),
            build: for_loop::build,
        },
    );
    registry.register(
        "set",
        StatementSyntax::BlockOrLine {
            end: "end-set".into(),
            line: set::build_line,
            block: set::build_block,
        },
    );
    registry.register(
        "set-str",
        StatementSyntax::BlockOrLine {
            end: "end-set".into(),
            line: set::build_str_line,
            block: set::build_str_block,
        },
    );
    registry.register("call", StatementSyntax::Line { build: call::build });
    registry.register(
        "spaceless",
        StatementSyntax::Block {
            end: "end-spaceless".into(),
            build: spaceless::build,
        },
    );
    registry.register(
        "raw",
        StatementSyntax::Verbatim {
            end: "end-raw".into(),
            build: verbatim::build,
        },
    );
    registry.register(
        "console-log",
        StatementSyntax::Line {
            build: directives::build_console_log,
        },
    );
    registry.register(
        "fatal-error",
        StatementSyntax::Line {
            build: directives::build_fatal_error,
        },
    );
    registry.register(
        "stop-render",
        StatementSyntax::Line {
            build: directives::build_stop_render,
        },
    );
    registry.register(
        "exclude-file",
        StatementSyntax::Line {
            build: directives::build_exclude_file,
        },
    );
}
