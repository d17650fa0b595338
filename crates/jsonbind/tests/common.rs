#![allow(missing_docs)]
#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use jsonbind::{Read, ReadObject, SchemaError, Write, WriteOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { r: f64 },
    Square { side: u64, tags: Vec<String> },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Drawing {
    pub name: String,
    pub checksum: Vec<u8>,
    pub shapes: Vec<Shape>,
}

pub fn drawing() -> Drawing {
    Drawing {
        name: "drawing".into(),
        checksum: vec![0xca, 0xfe],
        shapes: vec![
            Shape::Circle { r: 1.5 },
            Shape::Square {
                side: 2,
                tags: vec!["red".into()],
            },
        ],
    }
}

pub fn write_drawing(drawing: &Drawing, options: WriteOptions) -> String {
    let mut write = Write::with_options(options);
    {
        let mut root = write.object();
        root.string("name", &drawing.name);
        root.binary("checksum", &drawing.checksum);
        drop(root.object("meta"));
        let mut shapes = root.array("shapes");
        for shape in &drawing.shapes {
            match shape {
                Shape::Circle { r } => shapes.polymorph("circle").float("r", *r),
                Shape::Square { side, tags } => {
                    let mut square = shapes.polymorph("square");
                    square.uint("side", *side);
                    let mut list = square.array("tags");
                    for tag in tags {
                        list.string(tag);
                    }
                }
            }
        }
    }
    write.dump()
}

fn bind_shape(tag: &str, object: &mut ReadObject<'_>, out: &Rc<RefCell<Drawing>>) -> Result<(), SchemaError> {
    let shape = Rc::new(RefCell::new(match tag {
        "circle" => Shape::Circle { r: 0.0 },
        "square" => Shape::Square {
            side: 0,
            tags: Vec::new(),
        },
        other => return Err(SchemaError::custom(format!("unknown shape '{other}'"))),
    }));

    let s = Rc::clone(&shape);
    object.float("r", move |value| {
        if let Shape::Circle { r } = &mut *s.borrow_mut() {
            *r = value;
        }
        Ok(())
    });
    let s = Rc::clone(&shape);
    object.uint("side", move |value| {
        if let Shape::Square { side, .. } = &mut *s.borrow_mut() {
            *side = value;
        }
        Ok(())
    });
    let s = Rc::clone(&shape);
    object.array("tags", move |list| {
        let s = Rc::clone(&s);
        list.string(move |tag| {
            if let Shape::Square { tags, .. } = &mut *s.borrow_mut() {
                tags.push(tag);
            }
            Ok(())
        });
        Ok(())
    });
    let out = Rc::clone(out);
    object.finally(move || {
        out.borrow_mut().shapes.push(shape.borrow().clone());
        Ok(())
    });
    Ok(())
}

/// A reader for documents produced by [`write_drawing`].
pub fn drawing_reader(out: &Rc<RefCell<Drawing>>) -> Read<'static> {
    let mut read = Read::new();
    let out = Rc::clone(out);
    read.object(move |root| {
        let o = Rc::clone(&out);
        root.string("name", move |name| {
            o.borrow_mut().name = name;
            Ok(())
        });
        let o = Rc::clone(&out);
        root.binary("checksum", move |bytes| {
            o.borrow_mut().checksum = bytes;
            Ok(())
        });
        let o = Rc::clone(&out);
        root.array("shapes", move |shapes| {
            let o = Rc::clone(&o);
            shapes.polymorph(move |tag, object| bind_shape(&tag, object, &o));
            Ok(())
        });
        Ok(())
    });
    read
}

pub fn read_drawing(text: &str) -> Result<Drawing, jsonbind::ParseError> {
    let out = Rc::new(RefCell::new(Drawing::default()));
    drawing_reader(&out).parse(text)?;
    let drawing = out.borrow().clone();
    Ok(drawing)
}
