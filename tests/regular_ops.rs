//! Regular array codec behavior through the public API.

use binarray::{
    codec_error, CodecError, Collection, DimRange, Policy, RegularArray, SizeEncoding,
};

fn policy() -> Policy {
    Policy::new(SizeEncoding::One)
}

fn cube() -> RegularArray<i32> {
    let values: Vec<i32> = (0..24).collect();
    RegularArray::from_shape_values(&[2, 3, 4], &values, policy()).unwrap()
}

#[test]
fn shape_introspection() {
    let array = cube();
    assert_eq!(array.rank(), 3);
    assert_eq!(array.flat_length(), 24);
    assert_eq!(array.dim_lengths(), &[2, 3, 4]);
    assert_eq!(array.dim_length(2).unwrap(), 4);
    assert_eq!(array.strides().as_slice(), &[12, 4, 1]);
    assert_eq!(
        array.flat_length(),
        array.dim_lengths().iter().product::<usize>()
    );

    let err = array.dim_length(3).unwrap_err();
    assert_eq!(
        codec_error(&err),
        Some(&CodecError::IndexOutOfRange { index: 3, len: 3 })
    );
}

#[test]
fn flat_get_set_boundaries() {
    let array = cube();
    assert_eq!(array.get_flat(23).unwrap(), 23);
    assert!(matches!(
        codec_error(&array.get_flat(24).unwrap_err()),
        Some(CodecError::IndexOutOfRange { index: 24, len: 24 })
    ));

    let updated = array.set_flat(23, &-1).unwrap();
    assert_eq!(updated.get_dim(&[1, 2, 3]).unwrap(), -1);
    assert_eq!(array.get_flat(23).unwrap(), 23);
}

#[test]
fn dim_range_block_round_trip() {
    let array = cube();
    let ranges = [DimRange::new(1, 1), DimRange::new(1, 2), DimRange::new(2, 2)];
    let block = array.get_dim_range(&ranges).unwrap();
    assert_eq!(block.dim_lengths(), &[1, 2, 2]);
    assert_eq!(block.to_vec().unwrap(), vec![18, 19, 22, 23]);

    let zeroed = array.fill_dim_range(&ranges, &0).unwrap();
    assert_eq!(zeroed.get_dim_range(&ranges).unwrap().to_vec().unwrap(), vec![0; 4]);

    let restored = zeroed.set_dim_range(&[1, 1, 2], &block).unwrap();
    assert_eq!(restored, array);
}

#[test]
fn dim_range_arity_and_bounds() {
    let array = cube();
    let err = array
        .get_dim_range(&[DimRange::full(), DimRange::full()])
        .unwrap_err();
    assert_eq!(
        codec_error(&err),
        Some(&CodecError::DimensionMismatch { expected: 3, actual: 2 })
    );

    let err = array
        .fill_dim_range(&[DimRange::full(), DimRange::new(2, 2), DimRange::full()], &1)
        .unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::RangeOutOfBounds { start: 2, count: 2, len: 3 })
    ));
}

#[test]
fn flat_ranges_exchange_collections() {
    let array = cube();
    let run = array.get_flat_range(Some(4), Some(4)).unwrap();
    assert_eq!(run.to_vec().unwrap(), vec![4, 5, 6, 7]);

    let patch = Collection::from_values(&[100, 101], policy()).unwrap();
    let patched = array.set_flat_range(6, &patch).unwrap();
    assert_eq!(patched.get_dim(&[0, 1, 2]).unwrap(), 100);
    assert_eq!(patched.get_dim(&[0, 1, 3]).unwrap(), 101);

    let filled = array.fill_flat_range(Some(20), None, &9).unwrap();
    assert_eq!(filled.get_flat_range(Some(19), None).unwrap().to_vec().unwrap(), vec![19, 9, 9, 9, 9]);
}

#[test]
fn enumerate_flat_and_dim() {
    let array = cube();
    let flat: Vec<(usize, i32)> = array
        .enumerate_flat(Some(22), None)
        .unwrap()
        .collect::<eyre::Result<_>>()
        .unwrap();
    assert_eq!(flat, vec![(22, 22), (23, 23)]);

    let dims: Vec<(Vec<usize>, i32)> = array
        .enumerate_dim(&[DimRange::starting_at(1), DimRange::new(2, 1), DimRange::new(0, 2)])
        .unwrap()
        .map(|item| item.map(|(ix, v)| (ix.to_vec(), v)))
        .collect::<eyre::Result<_>>()
        .unwrap();
    assert_eq!(dims, vec![(vec![1, 2, 0], 20), (vec![1, 2, 1], 21)]);
}

#[test]
fn compact_array_reselects_width_on_set() {
    let array = RegularArray::<i64>::new(&[2, 2], policy().with_compact(true)).unwrap();
    assert_eq!(array.item_width(), Some(1));

    let array = array.set_dim(&[0, 1], &(i64::MAX)).unwrap();
    assert_eq!(array.item_width(), Some(8));
    assert_eq!(array.to_vec().unwrap(), vec![0, i64::MAX, 0, 0]);

    let array = array.fill_flat_range(None, None, &-3).unwrap();
    assert_eq!(array.item_width(), Some(1));
}

#[test]
fn parse_format_nested_text() {
    let array = RegularArray::<String>::parse(r#"[["a", "b"], ["c", "d"]]"#, policy()).unwrap();
    assert_eq!(array.dim_lengths(), &[2, 2]);
    assert_eq!(array.format().unwrap(), r#"[["a","b"],["c","d"]]"#);

    let empty = RegularArray::<bool>::parse("<0, 5>[]", policy()).unwrap();
    assert_eq!(empty.dim_lengths(), &[0, 5]);
    assert_eq!(empty.flat_length(), 0);
    assert_eq!(empty.format().unwrap(), "<0,5>[]");
}

#[test]
fn from_bytes_validates_shape() {
    let array = cube();
    let bytes = array.as_bytes().to_vec();
    assert_eq!(RegularArray::<i32>::from_bytes(bytes.clone()).unwrap(), array);

    let mut bad_extent = bytes.clone();
    // rank at offset 2, extents follow
    bad_extent[3] = 3;
    let err = RegularArray::<i32>::from_bytes(bad_extent).unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::TruncatedBuffer { .. })
    ));
}

#[test]
fn empty_array_with_huge_extents() {
    let big = u32::MAX as usize;
    let text = format!("<0,{big},{big},{big}>[]");
    let array = RegularArray::<u8>::parse(&text, Policy::new(SizeEncoding::Four)).unwrap();
    assert_eq!(array.flat_length(), 0);
    assert_eq!(array.dim_lengths(), &[0, big, big, big]);

    assert_eq!(array.strides().len(), 4);
    assert_eq!(array.format().unwrap(), text);
    assert_eq!(
        RegularArray::<u8>::parse(&array.format().unwrap(), array.policy()).unwrap(),
        array
    );

    let full = [DimRange::full(); 4];
    assert_eq!(array.enumerate_dim(&full).unwrap().count(), 0);
    let block = array.get_dim_range(&full).unwrap();
    assert_eq!(block, array);
    assert_eq!(array.fill_dim_range(&full, &7).unwrap(), array);
    assert!(array.get_flat(0).is_err());
    assert!(array.get_dim(&[0, 0, 0, 0]).is_err());

    // zero extent last, so a left-to-right product would overflow first
    let trailing = RegularArray::<u8>::new(&[big, big, big, 0], Policy::new(SizeEncoding::Four))
        .unwrap();
    assert_eq!(trailing.flat_length(), 0);
    assert_eq!(trailing.format().unwrap(), format!("<{big},{big},{big},0>[]"));
    assert_eq!(
        RegularArray::<u8>::from_bytes(trailing.as_bytes().to_vec()).unwrap(),
        trailing
    );
}

#[test]
fn create_with_unallocatable_shape_fails() {
    let err = RegularArray::<u8>::new(&[usize::MAX], Policy::new(SizeEncoding::Eight)).unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::EncodingOverflow { .. })
    ));

    let err = RegularArray::<i64>::new(&[1 << 40, 1 << 20], Policy::new(SizeEncoding::Eight))
        .unwrap_err();
    assert!(matches!(
        codec_error(&err),
        Some(CodecError::EncodingOverflow { .. })
    ));
}
