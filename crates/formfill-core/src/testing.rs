//! In-memory AcroForm fixtures shared by unit and integration tests.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// One field on the fixture's first page.
#[derive(Debug, Clone)]
pub enum FixtureField {
    Text(&'static str, &'static str),
    Checkbox(&'static str, &'static str),
    Choice(&'static str, &'static str, &'static [&'static str]),
    Radio(&'static str),
    Signature(&'static str),
    /// Text widget `child` whose field is a kid of non-terminal `parent`
    Nested {
        parent: &'static str,
        child: &'static str,
        value: &'static str,
    },
    /// Text field with two widgets on the same page
    TwoWidgets(&'static str, &'static str),
}

/// Letter-sized form with the given fields on page 1 and a blank page 2.
pub fn form_pdf(fields: &[FixtureField]) -> Vec<u8> {
    build(fields, [0, 0, 612, 792], None)
}

/// Page with no form fields and the given MediaBox.
pub fn blank_pdf(media_box: [i64; 4]) -> Vec<u8> {
    build(&[], media_box, None)
}

/// Page with no form fields whose visible area is cut down by a CropBox.
pub fn cropped_pdf(media_box: [i64; 4], crop_box: [i64; 4]) -> Vec<u8> {
    build(&[], media_box, Some(crop_box))
}

/// A document whose page tree has no pages.
pub fn pageless_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => Vec::<Object>::new(),
        "Count" => 0,
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    save(&mut doc)
}

fn build(fields: &[FixtureField], media_box: [i64; 4], crop_box: Option<[i64; 4]>) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut first_page = dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
    };
    if let Some(crop_box) = crop_box {
        first_page.set(
            "CropBox",
            crop_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
        );
    }
    let page_id = doc.add_object(first_page);
    let second_page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id), Object::Reference(second_page_id)],
            "Count" => 2,
        }),
    );

    let mut annots = Vec::new();
    let mut acro_fields = Vec::new();
    for (i, field) in fields.iter().enumerate() {
        let y = 700 - (i as i64) * 30;
        let rect = vec![
            Object::Integer(50),
            Object::Integer(y),
            Object::Integer(250),
            Object::Integer(y + 20),
        ];
        match field {
            FixtureField::Text(name, value) => {
                let id = add_widget(&mut doc, page_id, rect, terminal(name, b"Tx", text(value)));
                annots.push(id);
                acro_fields.push(id);
            }
            FixtureField::Checkbox(name, value) => {
                let mut dict = terminal(name, b"Btn", Object::Name(value.as_bytes().to_vec()));
                dict.set("AS", Object::Name(value.as_bytes().to_vec()));
                dict.set("AP", checkbox_appearance(&mut doc));
                let id = add_widget(&mut doc, page_id, rect, dict);
                annots.push(id);
                acro_fields.push(id);
            }
            FixtureField::Choice(name, value, options) => {
                let mut dict = terminal(name, b"Ch", text(value));
                dict.set("Ff", Object::Integer(1 << 17));
                dict.set(
                    "Opt",
                    options.iter().map(|o| text(o)).collect::<Vec<Object>>(),
                );
                let id = add_widget(&mut doc, page_id, rect, dict);
                annots.push(id);
                acro_fields.push(id);
            }
            FixtureField::Radio(name) => {
                let mut dict = terminal(name, b"Btn", Object::Name(b"Off".to_vec()));
                dict.set("Ff", Object::Integer(1 << 15));
                dict.set("AS", Object::Name(b"Off".to_vec()));
                dict.set("AP", checkbox_appearance(&mut doc));
                let id = add_widget(&mut doc, page_id, rect, dict);
                annots.push(id);
                acro_fields.push(id);
            }
            FixtureField::Signature(name) => {
                let id = add_widget(&mut doc, page_id, rect, terminal(name, b"Sig", Object::Null));
                annots.push(id);
                acro_fields.push(id);
            }
            FixtureField::Nested {
                parent,
                child,
                value,
            } => {
                let parent_id = doc.new_object_id();
                let widget = dictionary! {
                    "T" => text(child),
                    "V" => text(value),
                    "Parent" => Object::Reference(parent_id),
                };
                let widget_id = add_widget(&mut doc, page_id, rect, widget);
                doc.objects.insert(
                    parent_id,
                    Object::Dictionary(dictionary! {
                        "T" => text(parent),
                        "FT" => "Tx",
                        "Kids" => vec![Object::Reference(widget_id)],
                    }),
                );
                annots.push(widget_id);
                acro_fields.push(parent_id);
            }
            FixtureField::TwoWidgets(name, value) => {
                let field_id = doc.new_object_id();
                let mut kids = Vec::new();
                for offset in [0, 300] {
                    let kid_rect = vec![
                        Object::Integer(50 + offset),
                        Object::Integer(y),
                        Object::Integer(250 + offset),
                        Object::Integer(y + 20),
                    ];
                    let kid = dictionary! { "Parent" => Object::Reference(field_id) };
                    let kid_id = add_widget(&mut doc, page_id, kid_rect, kid);
                    annots.push(kid_id);
                    kids.push(Object::Reference(kid_id));
                }
                doc.objects.insert(
                    field_id,
                    Object::Dictionary(dictionary! {
                        "T" => text(name),
                        "FT" => "Tx",
                        "V" => text(value),
                        "Kids" => kids,
                    }),
                );
                acro_fields.push(field_id);
            }
        }
    }

    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        page.set(
            "Annots",
            annots.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        );
    }

    let acroform_id = doc.add_object(dictionary! {
        "Fields" => acro_fields.into_iter().map(Object::Reference).collect::<Vec<_>>(),
        "DA" => text("/Helv 0 Tf 0 g"),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
        "AcroForm" => Object::Reference(acroform_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    save(&mut doc)
}

fn terminal(name: &str, field_type: &[u8], value: Object) -> Dictionary {
    dictionary! {
        "T" => text(name),
        "FT" => Object::Name(field_type.to_vec()),
        "V" => value,
    }
}

fn add_widget(
    doc: &mut Document,
    page_id: ObjectId,
    rect: Vec<Object>,
    mut dict: Dictionary,
) -> ObjectId {
    dict.set("Type", "Annot");
    dict.set("Subtype", "Widget");
    dict.set("Rect", rect);
    dict.set("P", Object::Reference(page_id));
    doc.add_object(Object::Dictionary(dict))
}

fn checkbox_appearance(doc: &mut Document) -> Object {
    let bbox = || vec![0.into(), 0.into(), 20.into(), 20.into()];
    let on = doc.add_object(Stream::new(
        dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => bbox() },
        b"0 g 2 2 16 16 re f".to_vec(),
    ));
    let off = doc.add_object(Stream::new(
        dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => bbox() },
        Vec::new(),
    ));
    Object::Dictionary(dictionary! {
        "N" => dictionary! {
            "Yes" => Object::Reference(on),
            "Off" => Object::Reference(off),
        },
    })
}

fn text(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
