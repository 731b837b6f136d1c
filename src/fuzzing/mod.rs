//! Module for testing using fuzzing (quickcheck)

use std::fmt::Debug;

use quickcheck::Arbitrary;

use crate::*;

mod basic;

#[cfg(miri)]
const DEFAULT_NUM_TESTS: usize = 10;
#[cfg(not(miri))]
const DEFAULT_NUM_TESTS: usize = 2000;
const DEFAULT_GEN_SIZE: usize = 100;

fn proptest_runner<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F) {
    let num_tests: usize = std::env::var("QUICKCHECK_TESTS")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NUM_TESTS);

    let gen_size: usize = std::env::var("QUICKCHECK_GENERATOR_SIZE")
        .ok()
        .and_then(|x| x.parse::<usize>().ok())
        .unwrap_or(DEFAULT_GEN_SIZE);

    let mut gen = quickcheck::Gen::new(gen_size);

    // sample all inputs
    for _ in 0..num_tests {
        let input = A::arbitrary(&mut gen);
        let input_c = input.clone();
        let success = f(input_c);
        if !success {
            shrink_failure(f, input)
        }
    }
}

fn shrink_failure<A: Arbitrary + Debug + PartialEq, F: Fn(A) -> bool>(f: F, input: A) -> ! {
    for i in input.shrink() {
        let i_c = i.clone();
        let success = f(i_c);
        if !success {
            shrink_failure(f, i)
        }
    }
    // if we reach this point, then all shrunken inputs work. Therefore, `input` is the minimal
    // input
    panic!(
        "[QUICKCHECK] Test case failed!\n  Minimal input:\n    {:?}",
        input
    );
}

macro_rules! qc {
    ($name:ident, $f:ident) => {
        #[test]
        fn $name() {
            proptest_runner($f)
        }
    };
}
pub(crate) use qc;

/// An IPv4 network drawn from a deliberately small pool of octets and prefix
/// lengths, so that nesting, duplicate keys, and deep chains are frequent.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub(crate) struct TestNet(pub u32, pub u8);

impl TestNet {
    pub(crate) fn masked(self) -> u32 {
        self.0 & plen_mask(self.1)
    }
}

pub(crate) fn plen_mask(plen: u8) -> u32 {
    if plen == 0 {
        0
    } else {
        u32::MAX << (32 - plen)
    }
}

impl Debug for TestNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.masked().to_be_bytes();
        write!(f, "{a}.{b}.{c}.{d}/{}", self.1)
    }
}

impl Arbitrary for TestNet {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        #[rustfmt::skip]
        let plen: u8 = *g
            .choose(&[
                0,
                4, 6,
                8, 8, 8,
                10, 12, 14,
                16, 16, 16,
                18, 20, 22,
                24, 24,
                28, 30, 32,
            ])
            .unwrap();
        let a = *g.choose(&[10u8, 10, 10, 172, 192]).unwrap();
        let b = *g.choose(&[0u8, 0, 1, 2, 64]).unwrap();
        let c = *g.choose(&[0u8, 0, 1, 128]).unwrap();
        let d = *g.choose(&[0u8, 1, 255]).unwrap();
        let net = TestNet(u32::from_be_bytes([a, b, c, d]), plen);
        TestNet(net.masked(), plen)
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        if self.1 == 0 {
            quickcheck::empty_shrinker()
        } else {
            let shorter = TestNet(self.0, self.1 - 1);
            quickcheck::single_shrinker(TestNet(shorter.masked(), self.1 - 1))
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Operation {
    Add(TestNet),
    Remove(TestNet),
}

impl Arbitrary for Operation {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        let net = TestNet::arbitrary(g);
        if g.choose(&[
            true, true, true, true, true, true, true, false, false, false,
        ])
        .copied()
        .unwrap_or_default()
        {
            Self::Add(net)
        } else {
            Self::Remove(net)
        }
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        match self {
            Operation::Add(n) => Box::new(n.shrink().map(Operation::Add)),
            Operation::Remove(n) => Box::new(n.shrink().map(Operation::Remove)),
        }
    }
}

/// The obvious reference implementation: a flat list of (network, prefix
/// length) pairs scanned in full for every lookup.
#[derive(Default)]
pub(crate) struct NaiveTable {
    pub routes: Vec<(u32, u8)>,
}

impl NaiveTable {
    pub(crate) fn add(&mut self, net: TestNet) -> bool {
        let entry = (net.masked(), net.1);
        if self.routes.contains(&entry) {
            false
        } else {
            self.routes.push(entry);
            true
        }
    }

    pub(crate) fn remove(&mut self, net: TestNet) -> bool {
        let entry = (net.masked(), net.1);
        match self.routes.iter().position(|e| *e == entry) {
            Some(i) => {
                self.routes.swap_remove(i);
                true
            }
            None => false,
        }
    }

    pub(crate) fn best(&self, address: u32) -> Option<(u32, u8)> {
        self.routes
            .iter()
            .copied()
            .filter(|&(net, plen)| address & plen_mask(plen) == net)
            .max_by_key(|&(_, plen)| plen)
    }
}

pub(crate) fn address_key(address: u32) -> ByteKey {
    ByteKey::from_octets(&address.to_be_bytes())
}

pub(crate) fn plen_key(plen: u8) -> ByteKey {
    ByteKey::from_octets(&plen_mask(plen).to_be_bytes())
}

/// Decode a leaf back into the (network, prefix length) pair the model uses.
pub(crate) fn leaf_entry(table: &RadixTable, leaf: LeafRef) -> (u32, u8) {
    let k = table.key(leaf);
    let address = u32::from_be_bytes([k.byte(1), k.byte(2), k.byte(3), k.byte(4)]);
    let plen = match table.mask(leaf) {
        None => 32,
        Some(m) => {
            let mk = table.mask_key(m);
            u32::from_be_bytes([mk.byte(1), mk.byte(2), mk.byte(3), mk.byte(4)]).leading_ones()
                as u8
        }
    };
    (address & plen_mask(plen), plen)
}
