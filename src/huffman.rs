//! Canonical Huffman byte coder.
//!
//! A byte-frequency histogram drives a heap-built Huffman tree, with a
//! monotonic tie-breaker counter so that symbols of equal weight always
//! resolve in the same order and the codebook is reproducible run to
//! run. Lengths are then converted to canonical form: symbols are sorted
//! by `(length, symbol)` and codes are assigned with `(prev_code + 1) <<
//! (new_len - prev_len)`, so the codebook can be rebuilt from the length
//! table alone with no codes transmitted.
//!
//! Codes must fit in 4 bits each to fit the compact 128-byte length-only
//! header, so any natural code longer than 15 bits triggers a
//! length-limited (boundary package-merge) reconstruction that caps
//! every code at 15 bits.

use std::collections::{BinaryHeap, HashMap};

use bit_vec::BitVec;

use crate::error::Error;

const ALPHABET_SIZE: usize = 256;
const HEADER_BIT_COUNT_BYTES: usize = 4;
const HEADER_LENGTH_TABLE_BYTES: usize = 128;
const HEADER_SIZE_BYTES: usize = HEADER_BIT_COUNT_BYTES + HEADER_LENGTH_TABLE_BYTES;
const MAX_CODE_LEN: u8 = 15;

/// Canonical Huffman byte coder. Carries no per-instance configuration
/// (the alphabet is fixed at 0..=255); `new()` exists for API symmetry
/// with `WKCodec`.
#[derive(Clone, Copy, Debug, Default)]
pub struct HuffmanCodec;

impl HuffmanCodec {
    pub fn new() -> Self {
        HuffmanCodec
    }

    /// Compress `src` into a HuffmanFrame: 4-byte bit count, 128-byte
    /// length-only codebook, then the packed bitstream.
    pub fn compress(&self, src: &[u8]) -> Result<Vec<u8>, Error> {
        let mut freqs = [0u64; ALPHABET_SIZE];
        for &b in src {
            freqs[b as usize] += 1;
        }
        let lengths = build_code_lengths(&freqs);
        let codes = canonical_codes(&lengths);

        let mut code_of = [(0u32, 0u8); ALPHABET_SIZE];
        for &(symbol, code, len) in &codes {
            code_of[symbol as usize] = (code, len);
        }

        let mut bits = BitVec::new();
        for &b in src {
            let (code, len) = code_of[b as usize];
            push_code(&mut bits, code, len);
        }
        let num_bits_encoded = bits.len() as u32;
        let payload = bits.to_bytes();

        let mut out = Vec::with_capacity(HEADER_SIZE_BYTES + payload.len());
        out.extend_from_slice(&num_bits_encoded.to_be_bytes());
        out.extend_from_slice(&encode_length_table(&lengths));
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Inverse of `compress`.
    pub fn decompress(&self, frame: &[u8]) -> Result<Vec<u8>, Error> {
        if frame.len() < HEADER_SIZE_BYTES {
            return Err(Error::CorruptFrame(format!(
                "frame length {} is shorter than the {}-byte huffman header",
                frame.len(),
                HEADER_SIZE_BYTES
            )));
        }
        let num_bits_encoded = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        let table = &frame[HEADER_BIT_COUNT_BYTES..HEADER_SIZE_BYTES];
        let lengths = decode_length_table(table);
        let codes = canonical_codes(&lengths);

        let mut decode_map: HashMap<(u8, u32), u8> = HashMap::with_capacity(codes.len());
        for &(symbol, code, len) in &codes {
            decode_map.insert((len, code), symbol);
        }

        let payload = &frame[HEADER_SIZE_BYTES..];
        let available_bits = payload.len() * 8;
        if num_bits_encoded > available_bits {
            return Err(Error::CorruptFrame(format!(
                "declared bit count {} exceeds payload bit length {}",
                num_bits_encoded, available_bits
            )));
        }

        let bits = BitVec::from_bytes(payload);
        let mut out = Vec::new();
        let mut cur_code: u32 = 0;
        let mut cur_len: u8 = 0;
        for pos in 0..num_bits_encoded {
            let bit = bits.get(pos).expect("within declared bit count");
            cur_code = (cur_code << 1) | (bit as u32);
            cur_len += 1;
            if let Some(&symbol) = decode_map.get(&(cur_len, cur_code)) {
                out.push(symbol);
                cur_code = 0;
                cur_len = 0;
            } else if cur_len > MAX_CODE_LEN {
                return Err(Error::InvalidCode(format!(
                    "no symbol decodes after {} bits at bit offset {}",
                    cur_len, pos
                )));
            }
        }
        if cur_len != 0 {
            return Err(Error::InvalidCode(
                "trailing bits do not complete a code".to_string(),
            ));
        }
        Ok(out)
    }
}

fn push_code(bits: &mut BitVec, code: u32, len: u8) {
    for i in (0..len).rev() {
        bits.push((code >> i) & 1 == 1);
    }
}

fn encode_length_table(lengths: &[u8; ALPHABET_SIZE]) -> [u8; HEADER_LENGTH_TABLE_BYTES] {
    let mut table = [0u8; HEADER_LENGTH_TABLE_BYTES];
    for n in 0..HEADER_LENGTH_TABLE_BYTES {
        let left = lengths[2 * n];
        let right = lengths[2 * n + 1];
        table[n] = (left << 4) | right;
    }
    table
}

fn decode_length_table(table: &[u8]) -> [u8; ALPHABET_SIZE] {
    let mut lengths = [0u8; ALPHABET_SIZE];
    for n in 0..HEADER_LENGTH_TABLE_BYTES {
        lengths[2 * n] = table[n] >> 4;
        lengths[2 * n + 1] = table[n] & 0x0F;
    }
    lengths
}

/// Sort present symbols by `(length, symbol)` and assign canonical codes:
/// code 0 to the first, then `(prev_code + 1) << (new_len - prev_len)`
/// for each subsequent symbol.
fn canonical_codes(lengths: &[u8; ALPHABET_SIZE]) -> Vec<(u8, u32, u8)> {
    let mut present: Vec<(u8, u8)> = (0..ALPHABET_SIZE)
        .filter(|&s| lengths[s] > 0)
        .map(|s| (s as u8, lengths[s]))
        .collect();
    present.sort_by_key(|&(symbol, len)| (len, symbol));

    let mut codes = Vec::with_capacity(present.len());
    if present.is_empty() {
        return codes;
    }
    let (first_symbol, first_len) = present[0];
    codes.push((first_symbol, 0u32, first_len));
    let mut prev_code: u32 = 0;
    let mut prev_len = first_len;
    for &(symbol, len) in &present[1..] {
        prev_code = (prev_code + 1) << (len - prev_len);
        codes.push((symbol, prev_code, len));
        prev_len = len;
    }
    codes
}

/// Build a natural Huffman tree over present symbols with a `BinaryHeap`,
/// breaking weight ties on insertion order for determinism, then promote
/// to length-limited (<=15 bit) lengths if needed.
fn build_code_lengths(freqs: &[u64; ALPHABET_SIZE]) -> [u8; ALPHABET_SIZE] {
    enum Node {
        Leaf(u8),
        Internal(usize, usize),
    }

    let mut arena: Vec<Node> = Vec::new();
    let mut heap: BinaryHeap<std::cmp::Reverse<(u64, u32, usize)>> = BinaryHeap::new();
    let mut tie: u32 = 0;

    for symbol in 0..ALPHABET_SIZE {
        if freqs[symbol] > 0 {
            arena.push(Node::Leaf(symbol as u8));
            heap.push(std::cmp::Reverse((freqs[symbol], tie, arena.len() - 1)));
            tie += 1;
        }
    }

    if heap.is_empty() {
        return [0u8; ALPHABET_SIZE];
    }

    while heap.len() > 1 {
        let std::cmp::Reverse((w1, _, i1)) = heap.pop().unwrap();
        let std::cmp::Reverse((w2, _, i2)) = heap.pop().unwrap();
        arena.push(Node::Internal(i1, i2));
        let new_idx = arena.len() - 1;
        heap.push(std::cmp::Reverse((w1 + w2, tie, new_idx)));
        tie += 1;
    }
    let root = heap.pop().unwrap().0 .2;

    let mut lengths = [0u8; ALPHABET_SIZE];
    let mut stack = vec![(root, 0u8)];
    while let Some((idx, depth)) = stack.pop() {
        match arena[idx] {
            Node::Leaf(symbol) => {
                // depth.max(1) promotes the single-distinct-byte edge
                // case (root is itself a leaf at depth 0) to length 1.
                lengths[symbol as usize] = depth.max(1);
            }
            Node::Internal(a, b) => {
                stack.push((a, depth + 1));
                stack.push((b, depth + 1));
            }
        }
    }

    let max_len = lengths.iter().copied().max().unwrap_or(0);
    if max_len <= MAX_CODE_LEN {
        return lengths;
    }

    let mut present: Vec<(u8, u64)> = (0..ALPHABET_SIZE)
        .filter(|&s| freqs[s] > 0)
        .map(|s| (s as u8, freqs[s]))
        .collect();
    present.sort_by_key(|&(_, weight)| weight);
    let weights: Vec<u64> = present.iter().map(|&(_, w)| w).collect();
    let limited = length_limited_lengths(&weights, MAX_CODE_LEN as usize);

    let mut out = [0u8; ALPHABET_SIZE];
    for (&(symbol, _), &len) in present.iter().zip(limited.iter()) {
        out[symbol as usize] = len;
    }
    out
}

#[derive(Clone, Copy)]
struct PackageMergeNode {
    weight: u64,
    count: u32,
    tail: Option<usize>,
}

/// Boundary package-merge (Larmore & Hirschberg), bounding every code
/// length at `max_bits`. `weights` must be sorted ascending.
fn length_limited_lengths(weights: &[u64], max_bits: usize) -> Vec<u8> {
    let num_symbols = weights.len();
    if num_symbols == 0 {
        return Vec::new();
    }
    if num_symbols == 1 {
        return vec![1];
    }

    let mut pool: Vec<PackageMergeNode> = vec![
        PackageMergeNode { weight: weights[0], count: 1, tail: None },
        PackageMergeNode { weight: weights[1], count: 2, tail: None },
    ];
    let mut lists: Vec<[usize; 2]> = vec![[0usize, 1usize]; max_bits];

    let num_runs = 2 * num_symbols - 2;
    for i in 0..num_runs {
        let final_run = i == num_runs - 1;
        boundary_package_merge(&mut pool, &mut lists, weights, num_symbols, final_run, max_bits - 1);
    }

    let mut lengths = vec![0u8; num_symbols];
    let mut node = Some(lists[max_bits - 1][1]);
    while let Some(idx) = node {
        let n = pool[idx];
        for slot in lengths.iter_mut().take(n.count as usize) {
            *slot += 1;
        }
        node = n.tail;
    }
    lengths
}

fn boundary_package_merge(
    pool: &mut Vec<PackageMergeNode>,
    lists: &mut [[usize; 2]],
    leaves: &[u64],
    num_symbols: usize,
    final_run: bool,
    index: usize,
) {
    let lastcount = pool[lists[index][1]].count as usize;
    if index == 0 && lastcount >= num_symbols {
        return;
    }

    let oldchain = lists[index][1];
    let new_idx;

    if index == 0 {
        pool.push(PackageMergeNode {
            weight: leaves[lastcount],
            count: (lastcount + 1) as u32,
            tail: None,
        });
        new_idx = pool.len() - 1;
    } else {
        let sum = pool[lists[index - 1][0]].weight + pool[lists[index - 1][1]].weight;
        if lastcount < num_symbols && sum > leaves[lastcount] {
            let tail = pool[oldchain].tail;
            pool.push(PackageMergeNode {
                weight: leaves[lastcount],
                count: (lastcount + 1) as u32,
                tail,
            });
            new_idx = pool.len() - 1;
        } else {
            pool.push(PackageMergeNode {
                weight: sum,
                count: lastcount as u32,
                tail: Some(lists[index - 1][1]),
            });
            new_idx = pool.len() - 1;
            if !final_run {
                boundary_package_merge(pool, lists, leaves, num_symbols, false, index - 1);
                boundary_package_merge(pool, lists, leaves, num_symbols, false, index - 1);
            }
        }
    }

    lists[index][0] = oldchain;
    lists[index][1] = new_idx;
}
