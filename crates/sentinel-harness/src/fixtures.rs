//! Reference Fixture
//!
//! Nineteen fragments across six groups (default id shift), split between one
//! receiver and three feeders. With a threshold of three fragments four groups
//! resolve and two stay incomplete.

use sentinel_core::{Fragment, GroupId};

/// Fragments delivered through the receiver
pub const RECEIVER_FRAGMENTS: [u64; 5] = [
    0x0223_0000_000c,
    0x071e_124d_abef,
    0x0236_0037_680e,
    0x071d_2f8f_e0a1,
    0x0555_0015_0755,
];

/// Fragments pushed directly by each feeder thread
pub const FEEDER_FRAGMENTS: [&[u64]; 3] = [
    &[
        0x071f_6b83_42ab,
        0x0738_011f_538d,
        0x0732_0001_29c3,
        0x055e_6ecf_a0f9,
        0x02ff_aa02_7451,
        0x0228_0000_010b,
        0x02fb_0b88_bc3e,
    ],
    &[
        0x0737_0060_9bbd,
        0x0559_01d6_1e7b,
        0x022a_0000_032b,
        0x016f_0000_edfb,
    ],
    &[0x017f_4cb4_2a68, 0x0226_0000_000d, 0x0725_0000_0025],
];

/// Threshold at which the expected counts hold
pub const MIN_FRAGMENTS: usize = 3;

pub const EXPECTED_SENT: usize = 4;

pub const EXPECTED_INCOMPLETE: usize = 2;

/// Groups that never reach the threshold, ascending
pub const INCOMPLETE_GROUPS: [u64; 2] = [0x0b, 0x17];

pub fn receiver_fragments() -> Vec<Fragment> {
    RECEIVER_FRAGMENTS.iter().copied().map(Fragment::new).collect()
}

pub fn feeder_fragments() -> Vec<Vec<Fragment>> {
    FEEDER_FRAGMENTS
        .iter()
        .map(|raw| raw.iter().copied().map(Fragment::new).collect())
        .collect()
}

/// Every fragment in the fixture
pub fn all_fragments() -> Vec<Fragment> {
    let mut all = receiver_fragments();
    all.extend(feeder_fragments().into_iter().flatten());
    all
}

pub fn incomplete_groups() -> Vec<GroupId> {
    INCOMPLETE_GROUPS.iter().copied().map(GroupId::new).collect()
}
