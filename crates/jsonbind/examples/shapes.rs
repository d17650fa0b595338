//! Writes a small drawing, then reads it back in chunks and prints each shape
//! as soon as its object closes.
//!
//! Pass a path to read a drawing from a file instead:
//!
//! ```text
//! cargo run --example shapes -- drawing.json
//! ```
#![allow(missing_docs)]

use std::{cell::RefCell, rc::Rc};

use jsonbind::{ParseError, Read, ReadObject, SchemaError, Write};

#[derive(Debug, Default)]
struct Shape {
    kind: String,
    size: f64,
    label: Option<String>,
}

fn write_drawing() -> String {
    let mut write = Write::new();
    {
        let mut root = write.object();
        root.string("title", "demo");
        let mut shapes = root.array("shapes");
        shapes.polymorph("circle").float("r", 1.25);
        {
            let mut square = shapes.polymorph("square");
            square.uint("side", 4);
            square.string("label", "corner");
        }
        shapes.polymorph("circle").float("r", 0.5);
    }
    write.dump()
}

fn bind_shape(tag: String, object: &mut ReadObject<'_>) -> Result<(), SchemaError> {
    let size_key = match tag.as_str() {
        "circle" => "r",
        "square" => "side",
        other => return Err(SchemaError::custom(format!("unknown shape '{other}'"))),
    };
    let shape = Rc::new(RefCell::new(Shape {
        kind: tag,
        ..Shape::default()
    }));

    let s = Rc::clone(&shape);
    object.float(size_key, move |size| {
        s.borrow_mut().size = size;
        Ok(())
    });
    let s = Rc::clone(&shape);
    object.string("label", move |label| {
        s.borrow_mut().label = Some(label);
        Ok(())
    });
    object.finally(move || {
        println!("{:?}", shape.borrow());
        Ok(())
    });
    Ok(())
}

fn main() -> Result<(), ParseError> {
    let mut read = Read::new();
    read.object(|root| {
        root.string("title", |title| {
            println!("drawing {title}");
            Ok(())
        });
        root.array("shapes", |shapes| {
            shapes.polymorph(bind_shape);
            Ok(())
        });
        Ok(())
    });

    if let Some(path) = std::env::args().nth(1) {
        return read.parse_path(path);
    }

    let text = write_drawing();
    print!("{text}");
    for chunk in text.as_bytes().chunks(7) {
        read.feed(chunk)?;
    }
    read.finish()
}
