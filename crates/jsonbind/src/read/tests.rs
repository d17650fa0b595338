use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};
use core::cell::{Cell, RefCell};

use rstest::rstest;

use super::*;
use crate::error::ElementKind;

type Log = RefCell<Vec<String>>;

fn note(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

/// Registers a shape reader: `["utf8:circle", {"r": 1.5}]` or
/// `["utf8:square", {"side": 2}]`.
fn read_shape<'h>(log: &'h Log) -> impl FnMut(String, &mut ReadObject<'h>) -> ReadResult + 'h {
    move |tag, object| {
        note(log, format!("shape {tag}"));
        match tag.as_str() {
            "circle" => object.float("r", move |r| {
                note(log, format!("r {r}"));
                Ok(())
            }),
            "square" => object.uint("side", move |side| {
                note(log, format!("side {side}"));
                Ok(())
            }),
            other => return Err(SchemaError::custom(format_args!("unknown shape '{other}'"))),
        }
        Ok(())
    }
}

#[test]
fn nested_objects_and_arrays_dispatch_in_document_order() {
    let log = &Log::default();
    let mut read = Read::new();
    read.object(move |root| {
        root.string("name", move |name| {
            note(log, format!("name {name}"));
            Ok(())
        });
        root.array("tags", move |tags| {
            tags.string(move |tag| {
                note(log, format!("tag {tag}"));
                Ok(())
            });
            tags.finally(move || {
                note(log, "tags done");
                Ok(())
            });
            Ok(())
        });
        root.object("owner", move |owner| {
            owner.binary("key", move |key| {
                note(log, format!("key {key:?}"));
                Ok(())
            });
            Ok(())
        });
        root.finally(move || {
            note(log, "root done");
            Ok(())
        });
        Ok(())
    });

    read.parse(
        r#"{
            "name": "utf8:box",
            "tags": ["utf8:a", "utf8:b"],
            "owner": {"key": "alpha16:bpaa", "extra": [1, [true], {"x": null}]},
            "ignored": {"deep": [[["utf8:x"]]]}
        }"#,
    )
    .unwrap();

    assert_eq!(
        *log.borrow(),
        [
            "name box",
            "tag a",
            "tag b",
            "tags done",
            "key [31, 0]",
            "root done"
        ]
    );
}

#[test]
fn polymorph_array() {
    let log = &Log::default();
    let mut read = Read::new();
    read.array(move |shapes| {
        shapes.polymorph(read_shape(log));
        Ok(())
    });

    read.parse(r#"[["utf8:circle", {"r": 1.5, "side": 3}], ["utf8:square", {"side": 2}]]"#)
        .unwrap();

    assert_eq!(
        *log.borrow(),
        ["shape circle", "r 1.5", "shape square", "side 2"]
    );
}

#[test]
fn polymorph_field_and_top_level() {
    let log = &Log::default();
    let mut read = Read::new();
    read.object(move |root| {
        root.polymorph("shape", read_shape(log));
        Ok(())
    });
    read.parse(r#"{"shape": ["utf8:square", {"side": 9}]}"#).unwrap();
    drop(read);

    let mut read = Read::new();
    read.polymorph(read_shape(log));
    read.parse(r#"["utf8:circle", {"r": 0.5}]"#).unwrap();

    assert_eq!(
        *log.borrow(),
        ["shape square", "side 9", "shape circle", "r 0.5"]
    );
}

#[rstest]
#[case(r#"[{"r": 1}]"#, SchemaError::PolymorphWithoutType)]
#[case(r#"["utf8:circle", "utf8:square", {}]"#, SchemaError::PolymorphMultipleTypes)]
#[case(r#"["utf8:circle"]"#, SchemaError::PolymorphWithoutObject)]
#[case(r#"[]"#, SchemaError::PolymorphWithoutObject)]
#[case(r#"["utf8:circle", {}, "utf8:square"]"#, SchemaError::PolymorphWithoutObject)]
#[case(r#"["utf8:circle", {}, {}]"#, SchemaError::PolymorphWithoutType)]
#[case(r#"["utf8:circle", true]"#, SchemaError::NoHandler(ElementKind::Bool))]
#[case(r#"["utf8:circle", 1]"#, SchemaError::NoNumericHandler)]
#[case(r#"["alpha16:aa", {}]"#, SchemaError::NoHandler(ElementKind::Binary))]
#[case(r#"{"r": 1}"#, SchemaError::NoHandler(ElementKind::Object))]
fn malformed_polymorphs(#[case] input: &str, #[case] expected: SchemaError) {
    let log = &Log::default();
    let mut read = Read::new();
    read.polymorph(read_shape(log));
    let err = read.parse(input).unwrap_err();
    assert_eq!(err.schema_error(), Some(&expected), "{err}");
    assert!(err.syntax_error().is_none());
}

#[test]
fn handler_error_names_unknown_tag() {
    let log = &Log::default();
    let mut read = Read::new();
    read.polymorph(read_shape(log));
    let err = read.parse(r#"["utf8:hexagon", {}]"#).unwrap_err();
    assert_eq!(err.to_string(), "unknown shape 'hexagon'");
}

#[rstest]
#[case("[true, false]", Ok(()))]
#[case("[true, 1]", Err(SchemaError::NoNumericHandler))]
#[case("[true, \"utf8:x\"]", Err(SchemaError::NoHandler(ElementKind::String)))]
#[case("[[]]", Err(SchemaError::NoHandler(ElementKind::Array)))]
#[case("[[true]]", Err(SchemaError::NoHandler(ElementKind::Array)))]
#[case("[null, true]", Ok(()))]
#[case("[\"x\"]", Err(SchemaError::Tag(crate::TagError::UnknownPrefix("x".into()))))]
fn bool_array(#[case] input: &str, #[case] expected: ReadResult) {
    let count = &Cell::new(0);
    let mut read = Read::new();
    read.array(move |flags| {
        flags.bool(move |_| {
            count.set(count.get() + 1);
            Ok(())
        });
        Ok(())
    });
    let result = read.parse(input).map_err(|err| err.schema_error().cloned().unwrap());
    assert_eq!(result, expected);
}

#[test]
fn negative_zero_reads_as_unsigned_zero() {
    let seen = &RefCell::new(Vec::new());
    let mut read = Read::new();
    read.array(move |values| {
        values.uint(move |n| {
            seen.borrow_mut().push(n);
            Ok(())
        });
        Ok(())
    });
    read.parse("[-0, -0.0, 0]").unwrap();
    drop(read);
    assert_eq!(*seen.borrow(), [0, 0, 0]);
}

#[test]
fn unknown_prefix_fails_even_when_ignored() {
    let mut read = Read::new();
    read.object(|_| Ok(()));
    let err = read.parse(r#"{"anything": "plain"}"#).unwrap_err();
    assert_eq!(
        err.to_string(),
        "strings must start with utf8: or alpha16:, unknown tagged string 'plain'"
    );
}

#[test]
fn first_schema_error_wins() {
    let mut read = Read::new();
    read.array(|values| {
        values.int(|n| Err(SchemaError::custom(format_args!("rejected {n}"))));
        Ok(())
    });
    let err = read.parse("[1, 2, true]").unwrap_err();
    assert_eq!(err.to_string(), "rejected 1");
}

#[test]
fn schema_error_leads_syntax_error() {
    let mut read = Read::new();
    read.array(|values| {
        values.bool(|_| Ok(()));
        Ok(())
    });
    let err = read.parse("[1, true").unwrap_err();
    assert!(matches!(err, ParseError::SchemaThenSyntax { .. }));
    assert_eq!(
        err.to_string(),
        "found number in restricted context with no numeric handler\nunexpected end of input at 1:9"
    );

    let err = read.parse("[true, }").unwrap_err();
    assert!(err.schema_error().is_none());
    assert_eq!(
        err.syntax_error()
            .map(|syntax| (syntax.message(), syntax.line, syntax.column)),
        Some(("invalid character '}'", 1, 8))
    );
}

#[test]
fn finalizer_error_is_reported() {
    let mut read = Read::new();
    read.object(|root| {
        root.finally(|| Err(SchemaError::custom("incomplete")));
        Ok(())
    });
    let err = read.parse("{}").unwrap_err();
    assert_eq!(err.schema_error(), Some(&SchemaError::Custom("incomplete".into())));
}

#[test]
fn top_level_finalizer_runs_once_per_document() {
    let done = &Cell::new(0);
    let mut read = Read::new();
    read.bool(|_| Ok(()));
    read.finally(move || {
        done.set(done.get() + 1);
        Ok(())
    });
    read.parse("true").unwrap();
    read.parse("false").unwrap();
    assert!(read.parse("[").is_err());
    assert_eq!(done.get(), 2);
}

#[test]
fn multiple_values_each_reach_the_top_level_handler() {
    let seen = &RefCell::new(Vec::new());
    let mut read = Read::with_options(ReadOptions {
        allow_multiple_json_values: true,
        ..ReadOptions::default()
    });
    read.object(move |root| {
        root.int("n", move |n| {
            seen.borrow_mut().push(n);
            Ok(())
        });
        Ok(())
    });
    read.parse("{\"n\": 1}\n{\"n\": 2}\n{\"n\": 3e0}\n").unwrap();
    assert_eq!(*seen.borrow(), [1, 2, 3]);
}

#[test]
fn chunk_boundaries_do_not_matter() {
    let input = r#"{"list": [["utf8:circle", {"r": 2.25}], ["utf8:square", {"side": 12}]], "s": "utf8:é😀"}"#;
    for split in 0..=input.len() {
        let log = &Log::default();
        let mut read = Read::new();
        read.object(move |root| {
            root.array("list", move |list| {
                list.polymorph(read_shape(log));
                Ok(())
            });
            root.string("s", move |s| {
                note(log, s);
                Ok(())
            });
            Ok(())
        });
        read.feed(&input.as_bytes()[..split]).unwrap();
        read.feed(&input.as_bytes()[split..]).unwrap();
        read.finish().unwrap();
        drop(read);
        assert_eq!(
            *log.borrow(),
            ["shape circle", "r 2.25", "shape square", "side 12", "é😀"],
            "split at {split}"
        );
    }
}

#[test]
fn schema_error_is_visible_while_feeding() {
    let mut read = Read::new();
    read.array(|values| {
        values.bool(|_| Ok(()));
        Ok(())
    });
    read.feed("[true, 2,").unwrap();
    assert_eq!(read.schema_error(), Some(&SchemaError::NoNumericHandler));
    read.feed(" false]").unwrap();
    assert!(read.finish().is_err());

    read.reset();
    assert!(read.schema_error().is_none());
    read.feed("[false]").unwrap();
    read.finish().unwrap();
}

#[cfg(feature = "std")]
#[test]
fn parse_reader_streams_in_chunks() {
    let total = &Cell::new(0u64);
    let mut read = Read::new();
    read.array(move |values| {
        values.uint(move |n| {
            total.set(total.get() + n);
            Ok(())
        });
        Ok(())
    });

    let mut input = String::from("[");
    for n in 0..20_000u64 {
        if n > 0 {
            input.push(',');
        }
        input.push_str(&n.to_string());
    }
    input.push(']');
    assert!(input.len() > READ_CHUNK_SIZE);

    read.parse_reader(std::io::Cursor::new(input)).unwrap();
    assert_eq!(total.get(), (0..20_000u64).sum::<u64>());
}

#[cfg(feature = "std")]
#[test]
fn parse_path_reports_missing_file() {
    let mut read = Read::new();
    let err = read.parse_path("/nonexistent/jsonbind/input.json").unwrap_err();
    assert!(matches!(err, ParseError::Open { .. }));
    assert!(err.to_string().starts_with("unable to open /nonexistent/jsonbind/input.json"));
}
