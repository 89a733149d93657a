use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use just_core::Value;
use just_dom::Document;
use just_template::Template;

const ROW_SAMPLES: &[usize] = &[1, 8, 32, 128];

const ROW_TEMPLATE: &str = r#"<template><li data-strategy="row"><a data-strategy attr="href:url" text="title"></a><span data-strategy text="director"></span><button data-strategy action="click:select">open</button></li></template>"#;

fn film(index: usize) -> Value {
    Value::map([
        ("title", Value::from(format!("Film {index}"))),
        ("director", Value::from("Hayao Miyazaki")),
        ("url", Value::from(format!("#/films/{index}"))),
    ])
}

fn row_template(document: &Document) -> Template {
    let fragment = document.parse_fragment(ROW_TEMPLATE).expect("bench markup");
    let source = fragment.child_elements().remove(0);
    Template::builder(&source)
        .strategy("row", |segment, context, _parent| {
            if let Some(title) = context.get("title") {
                segment.set_attribute("data-title", title.to_string());
            }
            Ok(())
        })
        .build()
}

fn bench_render(c: &mut Criterion) {
    let document = Document::new();
    let template = row_template(&document);
    let mut group = c.benchmark_group("template_render");
    for &rows in ROW_SAMPLES {
        let films: Vec<Value> = (0..rows).map(film).collect();
        group.bench_with_input(BenchmarkId::from_parameter(rows), &films, |b, films| {
            b.iter(|| {
                let list = document.create_element("ul");
                for film in films {
                    let row = template.render(film).expect("render");
                    list.append_child(&row).expect("append");
                }
                black_box(list)
            });
        });
    }
    group.finish();
}

fn bench_clone_only(c: &mut Criterion) {
    let document = Document::new();
    let template = row_template(&document);
    c.bench_function("template_clone_content", |b| {
        b.iter(|| black_box(template.content().clone_node(true)))
    });
}

criterion_group!(benches, bench_render, bench_clone_only);
criterion_main!(benches);
