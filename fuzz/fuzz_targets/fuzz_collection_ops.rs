//! Fuzz testing for collection edits.
//!
//! A sequence of edits is applied both to a `Collection` and to a plain
//! `Vec` model. After every successful edit the two must agree.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use binarray::{Collection, Policy, SizeEncoding};

#[derive(Debug, Arbitrary)]
struct OpsInput {
    compact: bool,
    item_sizing: u8,
    operations: Vec<Operation>,
}

#[derive(Debug, Arbitrary)]
enum Operation {
    Insert(Option<u8>, i64),
    Set(u8, i64),
    RemoveAt(u8),
    RemoveRange(u8, Option<u8>),
    InsertRepeat(Option<u8>, i64, u8),
    Clear,
    PushText(String),
}

fuzz_target!(|input: OpsInput| {
    if input.operations.len() > 256 {
        return;
    }

    let sizing = match input.item_sizing % 4 {
        0 => SizeEncoding::One,
        1 => SizeEncoding::Two,
        2 => SizeEncoding::Four,
        _ => SizeEncoding::Eight,
    };
    let policy = Policy::new(SizeEncoding::Four)
        .with_item_sizing(sizing)
        .with_compact(input.compact);

    let mut ints = Collection::<i64>::new(policy).unwrap();
    let mut ints_model: Vec<i64> = Vec::new();
    let mut texts = Collection::<String>::new(policy).unwrap();
    let mut texts_model: Vec<String> = Vec::new();

    for op in &input.operations {
        let next = match op {
            Operation::Insert(index, value) => ints.insert(index.map(usize::from), value),
            Operation::Set(index, value) => ints.set(usize::from(*index), value),
            Operation::RemoveAt(index) => ints.remove_at(usize::from(*index)),
            Operation::RemoveRange(index, count) => {
                ints.remove_range(usize::from(*index), count.map(usize::from))
            }
            Operation::InsertRepeat(index, value, count) => {
                ints.insert_repeat(index.map(usize::from), value, usize::from(*count))
            }
            Operation::Clear => ints.clear(),
            Operation::PushText(s) => {
                if s.len() <= 1024 {
                    if let Ok(next) = texts.insert(None, s) {
                        texts = next;
                        texts_model.push(s.clone());
                    }
                }
                continue;
            }
        };

        let Ok(next) = next else {
            continue;
        };
        match op {
            Operation::Insert(index, value) => {
                let at = index.map_or(ints_model.len(), usize::from);
                ints_model.insert(at, *value);
            }
            Operation::Set(index, value) => ints_model[usize::from(*index)] = *value,
            Operation::RemoveAt(index) => {
                ints_model.remove(usize::from(*index));
            }
            Operation::RemoveRange(index, count) => {
                let start = usize::from(*index);
                let end = count.map_or(ints_model.len(), |c| start + usize::from(c));
                ints_model.drain(start..end);
            }
            Operation::InsertRepeat(index, value, count) => {
                let at = index.map_or(ints_model.len(), usize::from);
                let run = std::iter::repeat(*value).take(usize::from(*count));
                ints_model.splice(at..at, run);
            }
            Operation::Clear => ints_model.clear(),
            Operation::PushText(_) => {}
        }
        ints = next;

        assert_eq!(ints.count(), ints_model.len());
        assert_eq!(ints.to_vec().unwrap(), ints_model);
    }

    assert_eq!(texts.to_vec().unwrap(), texts_model);
    let reparsed = Collection::<String>::parse(&texts.format().unwrap(), texts.policy()).unwrap();
    assert_eq!(reparsed, texts);
});
