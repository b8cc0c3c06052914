#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Property tests: the tag scanner never panics or loops on hostile input

use proptest::prelude::*;
use scumm_formats::chunk::{build_block, build_small_block};
use scumm_formats::scan::{ChunkIter, find_tag, find_tag_small};
use scumm_formats::{SmallTag, Tag};

fn known_tag() -> impl Strategy<Value = Tag> {
    prop_oneof![
        Just(Tag::RMHD),
        Just(Tag::OBCD),
        Just(Tag::LSCR),
        Just(Tag::BOXD),
        Just(Tag::SCRP),
    ]
}

proptest! {
    /// Arbitrary bytes either yield a result or an error, never a panic
    #[test]
    fn scan_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512), tag in known_tag()) {
        let _ = find_tag(tag, &data);
        let _ = find_tag_small(tag, &data);
        let _ = ChunkIter::new(&data, false).count();
        let _ = ChunkIter::new(&data, true).count();
    }

    /// A child placed anywhere in a well-formed block is found
    #[test]
    fn scan_finds_child(
        before in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..6),
        body in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut payload = Vec::new();
        for filler in &before {
            payload.extend(build_block(Tag::RMHD, filler));
        }
        payload.extend(build_block(Tag::BOXD, &body));
        let block = build_block(Tag::ROOM, &payload);

        let found = find_tag(Tag::BOXD, &block).unwrap().unwrap();
        prop_assert_eq!(&found[8..], &body[..]);
    }

    /// Same for small-header blocks
    #[test]
    fn scan_small_finds_child(
        before in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 0..6),
        body in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut payload = Vec::new();
        for filler in &before {
            payload.extend(build_small_block(SmallTag(*b"HD"), filler));
        }
        payload.extend(build_small_block(SmallTag(*b"BX"), &body));
        let block = build_small_block(SmallTag(*b"RO"), &payload);

        let found = find_tag_small(Tag::BOXD, &block).unwrap().unwrap();
        prop_assert_eq!(&found[6..], &body[..]);
    }
}
