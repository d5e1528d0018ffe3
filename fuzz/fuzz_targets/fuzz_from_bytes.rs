//! Fuzz testing for buffer validation.
//!
//! Arbitrary bytes are handed to `from_bytes` for every kind. Accepted
//! buffers must decode, format and re-parse to the same bytes.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use binarray::{Collection, Guid, Item, RegularArray, Timestamp};

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzKind {
    Boolean,
    Byte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Timestamp,
    Guid,
    Text,
    Raw,
}

#[derive(Debug, Arbitrary)]
struct BufferInput {
    kind: FuzzKind,
    regular: bool,
    data: Vec<u8>,
}

fn check_collection<T: Item>(data: Vec<u8>) {
    let Ok(coll) = Collection::<T>::from_bytes(data) else {
        return;
    };
    let values = coll.to_vec().expect("validated buffer must decode");
    assert_eq!(values.len(), coll.count());
    for (i, item) in coll.enumerate(None, None).unwrap().enumerate() {
        let (index, value) = item.expect("validated buffer must enumerate");
        assert_eq!(index, i);
        assert_eq!(value, values[i]);
    }
    if let Ok(text) = coll.format() {
        if let Ok(again) = Collection::<T>::parse(&text, coll.policy()) {
            assert_eq!(again.count(), coll.count());
        }
    }
}

fn check_regular<T: Item>(data: Vec<u8>) {
    let Ok(array) = RegularArray::<T>::from_bytes(data) else {
        return;
    };
    assert_eq!(
        array.flat_length(),
        array.dim_lengths().iter().product::<usize>()
    );
    if array.flat_length() > 0 {
        let last = array.flat_length() - 1;
        let ix = array.dim_index_of(last).unwrap();
        assert_eq!(array.flat_index_of(&ix).unwrap(), last);
        let _ = array.get_flat(last);
    }
}

fn check<T: Item>(regular: bool, data: Vec<u8>) {
    if regular {
        check_regular::<T>(data);
    } else {
        check_collection::<T>(data);
    }
}

fuzz_target!(|input: BufferInput| {
    if input.data.len() > 4096 {
        return;
    }

    let BufferInput { kind, regular, data } = input;
    match kind {
        FuzzKind::Boolean => check::<bool>(regular, data),
        FuzzKind::Byte => check::<u8>(regular, data),
        FuzzKind::Int16 => check::<i16>(regular, data),
        FuzzKind::Int32 => check::<i32>(regular, data),
        FuzzKind::Int64 => check::<i64>(regular, data),
        FuzzKind::Single => check::<f32>(regular, data),
        FuzzKind::Double => check::<f64>(regular, data),
        FuzzKind::Timestamp => check::<Timestamp>(regular, data),
        FuzzKind::Guid => check::<Guid>(regular, data),
        FuzzKind::Text => check::<String>(regular, data),
        FuzzKind::Raw => check::<Vec<u8>>(regular, data),
    }
});
