use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsonflux::{json_record, Value};

json_record! {
    #[derive(Debug, Default, PartialEq)]
    pub struct SmallRecord {
        pub id: u64 => "id";
        pub name: String => "name";
        pub active: bool => "active";
        pub score: f64 => "score";
        pub tags: Vec<String> => "tags", omitempty;
    }
}

fn sample_record() -> SmallRecord {
    SmallRecord {
        id: 123_456,
        name: "a moderately sized name".into(),
        active: true,
        score: 98.6,
        tags: vec!["alpha".into(), "beta".into(), "gamma".into()],
    }
}

fn sample_document() -> Vec<u8> {
    let mut items = String::from("[");
    for i in 0..100 {
        if i > 0 {
            items.push(',');
        }
        items.push_str(&format!(
            r#"{{"id":{i},"name":"item {i}","nested":{{"flag":true,"vals":[1,2,3]}}}}"#
        ));
    }
    items.push(']');
    items.into_bytes()
}

fn bench_encode(c: &mut Criterion) {
    let record = sample_record();
    c.bench_function("encode_record", |b| {
        b.iter(|| jsonflux::encode(black_box(&record)).unwrap());
    });

    let mut value = Value::Null;
    jsonflux::decode(&sample_document(), &mut value).unwrap();
    c.bench_function("encode_value_100_items", |b| {
        b.iter(|| jsonflux::encode(black_box(&value)).unwrap());
    });
}

fn bench_decode(c: &mut Criterion) {
    let bytes = jsonflux::encode(&sample_record()).unwrap();
    c.bench_function("decode_record", |b| {
        b.iter(|| {
            let mut record = SmallRecord::default();
            jsonflux::decode(black_box(&bytes), &mut record).unwrap();
            record
        });
    });

    let doc = sample_document();
    c.bench_function("decode_value_100_items", |b| {
        b.iter(|| {
            let mut value = Value::Null;
            jsonflux::decode(black_box(&doc), &mut value).unwrap();
            value
        });
    });
}

fn bench_extract(c: &mut Criterion) {
    let doc = br#"{"a":{"b":{"c":{"d":[1,2,3,4,5]}}},"filler":"ignored"}"#;
    c.bench_function("extract_deep_path", |b| {
        b.iter(|| jsonflux::extract(black_box(doc), &["a", "b", "c", "d"]).unwrap());
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_extract);
criterion_main!(benches);
