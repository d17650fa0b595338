#![no_main]
use std::cell::RefCell;

use arbitrary::Arbitrary;
use jsonbind::{Read, ReadObject, ReadOptions};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    text: &'a [u8],
    splits: Vec<u16>,
    allow_multiple_json_values: bool,
    max_depth: u8,
}

type Log = RefCell<Vec<String>>;

/// Binds every field kind, recursing through `"children"` polymorphs.
fn bind<'h>(object: &mut ReadObject<'h>, log: &'h Log) {
    object.bool("b", move |value| {
        log.borrow_mut().push(format!("bool {value}"));
        Ok(())
    });
    object.int("i", move |value| {
        log.borrow_mut().push(format!("int {value}"));
        Ok(())
    });
    object.float("f", move |value| {
        log.borrow_mut().push(format!("float {value:?}"));
        Ok(())
    });
    object.string("s", move |value| {
        log.borrow_mut().push(format!("string {value:?}"));
        Ok(())
    });
    object.binary("d", move |value| {
        log.borrow_mut().push(format!("binary {value:?}"));
        Ok(())
    });
    object.array("children", move |children| {
        children.polymorph(move |tag, child| {
            log.borrow_mut().push(format!("polymorph {tag}"));
            bind(child, log);
            Ok(())
        });
        Ok(())
    });
    object.finally(move || {
        log.borrow_mut().push("close".to_owned());
        Ok(())
    });
}

/// Parses `chunks` in order, returning the dispatch log and the error text.
fn run<'a>(options: ReadOptions, chunks: impl Iterator<Item = &'a [u8]>) -> (Vec<String>, Option<String>) {
    let log = &Log::default();
    let mut read = Read::with_options(options);
    read.object(move |root| {
        bind(root, log);
        Ok(())
    });
    let mut result = Ok(());
    for chunk in chunks {
        result = read.feed(chunk);
        if result.is_err() {
            break;
        }
    }
    let result = result.and_then(|()| read.finish());
    drop(read);
    (log.take(), result.err().map(|err| err.to_string()))
}

fuzz_target!(|input: Input<'_>| {
    let options = ReadOptions {
        allow_multiple_json_values: input.allow_multiple_json_values,
        max_depth: (input.max_depth != 0).then(|| usize::from(input.max_depth)),
    };

    let whole = run(options, std::iter::once(input.text));

    let mut cuts: Vec<usize> = input
        .splits
        .iter()
        .map(|&s| usize::from(s) % (input.text.len() + 1))
        .collect();
    cuts.sort_unstable();
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(&input.text[start..cut]);
        start = cut;
    }
    chunks.push(&input.text[start..]);
    let split = run(options, chunks.into_iter());

    assert_eq!(whole, split, "chunking changed the outcome for {:?}", String::from_utf8_lossy(input.text));
});
