//! Scenario tests for the codec module

use super::*;
use crate::config::CodecConfig;
use crate::encoding::SizeEncoding;
use crate::error::{codec_error, CodecError};
use crate::types::{Codepage, Guid, Timestamp};

fn one_byte() -> Policy {
    Policy::new(SizeEncoding::One)
}

fn reparses_identically<T: Item>(coll: &Collection<T>) {
    let text = coll.format().unwrap();
    let again = Collection::<T>::parse(&text, coll.policy()).unwrap();
    assert_eq!(again.as_bytes(), coll.as_bytes(), "text was {:?}", text);
}

fn array_reparses_identically<T: Item>(array: &RegularArray<T>) {
    let text = array.format().unwrap();
    let again = RegularArray::<T>::parse(&text, array.policy()).unwrap();
    assert_eq!(again.as_bytes(), array.as_bytes(), "text was {:?}", text);
}

#[test]
fn compact_int32_collection_stores_one_byte_items() {
    let policy = one_byte().with_compact(true);
    let mut coll = Collection::<i32>::new(policy).unwrap();
    for _ in 0..3 {
        coll = coll.insert(None, &5).unwrap();
    }

    assert_eq!(coll.count(), 3);
    assert_eq!(coll.format().unwrap(), "5,5,5");
    assert_eq!(coll.item_width(), Some(1));
    // kind, flags, count, three one-byte items
    assert_eq!(coll.as_bytes().len(), 2 + 1 + 3);
}

#[test]
fn compact_width_grows_and_shrinks_with_content() {
    let coll = Collection::from_values(&[1i64, -1], one_byte().with_compact(true)).unwrap();
    assert_eq!(coll.item_width(), Some(1));

    let wide = coll.set(1, &-40_000).unwrap();
    assert_eq!(wide.item_width(), Some(4));
    assert_eq!(wide.to_vec().unwrap(), vec![1, -40_000]);

    let narrow = wide.remove_at(1).unwrap();
    assert_eq!(narrow.item_width(), Some(1));
    assert_eq!(narrow, Collection::from_values(&[1i64], one_byte().with_compact(true)).unwrap());
}

#[test]
fn boolean_grid_set_dim_is_visible_at_flat_index() {
    let grid = RegularArray::<bool>::new(&[2, 3], one_byte()).unwrap();
    assert_eq!(grid.rank(), 2);
    assert_eq!(grid.flat_length(), 6);
    assert_eq!(grid.dim_lengths(), &[2, 3]);

    let grid = grid.set_dim(&[1, 2], &true).unwrap();
    assert!(grid.get_flat(5).unwrap());
    assert_eq!(grid.index_of(&true).unwrap(), Some(5));
}

#[test]
fn text_get_range_past_end_fails() {
    let coll = Collection::<String>::parse("a,b,c,d", one_byte()).unwrap();
    let err = coll.get_range(Some(5), None).unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::RangeOutOfBounds { start: 5, len: 4, .. })
    ));
}

#[test]
fn text_index_of_missing_value_is_none() {
    let coll = Collection::<String>::parse("a,b,c", one_byte()).unwrap();
    assert_eq!(coll.index_of(&"z".to_string()).unwrap(), None);
    assert_eq!(coll.index_of(&"c".to_string()).unwrap(), Some(2));
}

#[test]
fn count_changes_with_structural_edits() {
    let coll = Collection::from_values(&[1u8, 2, 3], one_byte()).unwrap();
    assert_eq!(coll.insert(Some(1), &9).unwrap().count(), 4);
    assert_eq!(coll.remove_at(0).unwrap().count(), 2);

    let cleared = coll.clear().unwrap();
    assert_eq!(cleared.count(), 0);
    assert_eq!(cleared.clear().unwrap(), cleared);
    assert_eq!(cleared.policy(), coll.policy());
}

#[test]
fn get_boundaries() {
    let coll = Collection::from_values(&[10i16, 20], one_byte()).unwrap();
    assert_eq!(coll.get(1).unwrap(), 20);
    let err = coll.get(2).unwrap_err();
    assert_eq!(
        codec_error(&err),
        Some(&CodecError::IndexOutOfRange { index: 2, len: 2 })
    );

    let array = coll.to_array().unwrap();
    assert_eq!(array.get_flat(1).unwrap(), 20);
    assert!(array.get_flat(2).is_err());
}

#[test]
fn text_set_with_longer_value_shifts_following_items() {
    let coll = Collection::<String>::parse(r#""x","y","z""#, one_byte()).unwrap();
    let coll = coll.set(0, &"a much longer value".to_string()).unwrap();
    assert_eq!(coll.get(1).unwrap(), "y");
    assert_eq!(coll.get(2).unwrap(), "z");
    assert_eq!(
        Collection::<String>::from_bytes(coll.as_bytes().to_vec()).unwrap(),
        coll
    );
}

#[test]
fn repeat_and_range_edits() {
    let coll = Collection::from_values(&[0i32; 5], one_byte()).unwrap();
    let coll = coll.set_repeat(1, &7, 3).unwrap();
    assert_eq!(coll.to_vec().unwrap(), vec![0, 7, 7, 7, 0]);

    let coll = coll.insert_repeat(None, &1, 2).unwrap();
    assert_eq!(coll.count(), 7);

    let head = coll.get_range(None, Some(2)).unwrap();
    let coll = coll.insert_range(Some(0), &head).unwrap();
    assert_eq!(coll.to_vec().unwrap(), vec![0, 7, 0, 7, 7, 7, 0, 1, 1]);

    let coll = coll.remove_range(2, None).unwrap();
    assert_eq!(coll.to_vec().unwrap(), vec![0, 7]);

    assert!(coll.set_repeat(1, &0, 2).is_err());
}

#[test]
fn enumerate_yields_absolute_positions_and_restarts() {
    let coll = Collection::from_values(&[5u8, 6, 7, 8], one_byte()).unwrap();
    let iter = coll.enumerate(Some(1), Some(2)).unwrap();
    let first: Vec<_> = iter.clone().map(|r| r.unwrap()).collect();
    let second: Vec<_> = iter.map(|r| r.unwrap()).collect();
    assert_eq!(first, vec![(1, 6), (2, 7)]);
    assert_eq!(first, second);
}

#[test]
fn enumerate_dim_yields_coordinates() {
    let values: Vec<Vec<u8>> = (0u8..6).map(|b| vec![b; b as usize]).collect();
    let array = RegularArray::from_shape_values(&[3, 2], &values, one_byte()).unwrap();
    let items: Vec<(Vec<usize>, Vec<u8>)> = array
        .enumerate_dim(&[DimRange::new(1, 2), DimRange::new(1, 1)])
        .unwrap()
        .map(|r| r.map(|(ix, v)| (ix.to_vec(), v)).unwrap())
        .collect();
    assert_eq!(items, vec![(vec![1, 1], vec![3; 3]), (vec![2, 1], vec![5; 5])]);
}

#[test]
fn flat_and_dim_addressing_agree() {
    let values: Vec<i32> = (0..24).map(|v| v * 10).collect();
    let array = RegularArray::from_shape_values(&[2, 3, 4], &values, one_byte()).unwrap();
    for (flat, value) in values.iter().enumerate() {
        let ix = array.dim_index_of(flat).unwrap();
        assert_eq!(array.get_dim(&ix).unwrap(), *value);
        assert_eq!(array.flat_index_of(&ix).unwrap(), flat);
    }
}

#[test]
fn to_collection_and_back_preserve_items() {
    let array = RegularArray::<f32>::parse("[[1.5,2],[3,4]]", one_byte()).unwrap();
    let coll = array.to_collection().unwrap();
    assert_eq!(coll.to_vec().unwrap(), vec![1.5, 2.0, 3.0, 4.0]);

    let line = coll.to_array().unwrap();
    assert_eq!(line.dim_lengths(), &[4]);
    assert_eq!(line.to_vec().unwrap(), array.to_vec().unwrap());
}

#[test]
fn to_collection_overflowing_count_sizing_fails() {
    let array = RegularArray::<u8>::new(&[16, 16], one_byte()).unwrap();
    let err = array.to_collection().unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::EncodingOverflow { value: 256, width: 1 })
    ));
}

#[test]
fn every_kind_round_trips_through_text() {
    reparses_identically(&Collection::from_values(&[true, false, true], one_byte()).unwrap());
    reparses_identically(&Collection::from_values(&[0u8, 255], one_byte()).unwrap());
    reparses_identically(
        &Collection::from_values(&[i16::MIN, i16::MAX], one_byte().with_compact(true)).unwrap(),
    );
    reparses_identically(&Collection::from_values(&[i32::MIN, 0], one_byte()).unwrap());
    reparses_identically(
        &Collection::from_values(&[i64::MAX, -3], one_byte().with_compact(true)).unwrap(),
    );
    reparses_identically(
        &Collection::from_values(&[0.1f32, -0.0, f32::INFINITY, 3.4e38], one_byte()).unwrap(),
    );
    reparses_identically(
        &Collection::from_values(&[1e-300f64, 0.1 + 0.2, f64::NEG_INFINITY], one_byte()).unwrap(),
    );
    reparses_identically(
        &Collection::from_values(
            &[Timestamp(0), Timestamp(-1), Timestamp(1_709_208_000_123_456)],
            one_byte(),
        )
        .unwrap(),
    );
    reparses_identically(
        &Collection::from_values(&[Guid([0xAB; 16]), Guid::default()], one_byte()).unwrap(),
    );
    reparses_identically(
        &Collection::from_values(
            &[
                String::new(),
                " padded ".to_string(),
                r#"quote " and \ backslash"#.to_string(),
                "a,b[c]".to_string(),
            ],
            one_byte().with_codepage(Codepage::Utf16Be),
        )
        .unwrap(),
    );
    reparses_identically(
        &Collection::from_values(&[vec![], vec![0u8, 0xFF]], one_byte()).unwrap(),
    );
    reparses_identically(&Collection::<u8>::new(one_byte()).unwrap());
}

#[test]
fn regular_arrays_round_trip_through_text() {
    array_reparses_identically(
        &RegularArray::from_shape_values(&[2, 2], &[true, false, false, true], one_byte()).unwrap(),
    );
    array_reparses_identically(&RegularArray::<i64>::new(&[2, 0], one_byte()).unwrap());
    array_reparses_identically(&RegularArray::<String>::new(&[0, 3], one_byte()).unwrap());
    array_reparses_identically(
        &RegularArray::from_shape_values(
            &[1, 2, 1],
            &["[x]".to_string(), "y,z".to_string()],
            one_byte(),
        )
        .unwrap(),
    );
    assert_eq!(
        RegularArray::<i64>::new(&[2, 0], one_byte()).unwrap().format().unwrap(),
        "<2,0>[]"
    );
}

#[test]
fn parse_errors_are_reported() {
    let err = Collection::<i16>::parse("1, 70000", one_byte()).unwrap_err();
    assert!(matches!(codec_error(&err), Some(CodecError::ParseError(_))));

    let err = RegularArray::<u8>::parse("[[1,2],[3]]", one_byte()).unwrap_err();
    assert!(matches!(codec_error(&err), Some(CodecError::ParseError(_))));

    let err = RegularArray::<u8>::parse("<2,2>[[1,2]]", one_byte()).unwrap_err();
    assert!(matches!(codec_error(&err), Some(CodecError::ParseError(_))));
}

#[test]
fn config_supplies_default_codepage() {
    let config = CodecConfig::default().with_default_codepage(Codepage::Latin1);
    let coll =
        Collection::<String>::parse_with_config("caf\u{e9}", Policy::default(), &config).unwrap();
    assert_eq!(coll.codepage(), Some(Codepage::Latin1));
    assert_eq!(coll.get(0).unwrap(), "caf\u{e9}");

    let err = Collection::<String>::parse(
        "caf\u{e9}",
        Policy::default().with_codepage(Codepage::Ascii),
    )
    .unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::UnmappableCharacter { .. })
    ));
}

#[test]
fn unmappable_needle_is_absent() {
    let coll = Collection::<String>::parse("a", Policy::default().with_codepage(Codepage::Ascii))
        .unwrap();
    assert_eq!(coll.index_of(&"\u{e9}".to_string()).unwrap(), None);
}

#[test]
fn edits_never_touch_the_input() {
    let coll = Collection::from_values(&[1u8, 2, 3], one_byte()).unwrap();
    let before = coll.as_bytes().to_vec();
    let _ = coll.set(0, &9).unwrap();
    let _ = coll.insert(Some(9), &9).unwrap_err();
    let _ = coll.remove_range(1, None).unwrap();
    assert_eq!(coll.as_bytes(), &before[..]);
}
