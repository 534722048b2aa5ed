//! Runs the whole test binary on the allocator: every `Vec`, `Box` and
//! `String` below (plus the harness's own allocations) goes through it.

use std::sync::{mpsc, Arc};
use std::thread;

use scree::Scree;

#[global_allocator]
static GLOBAL: Scree = Scree;

#[test]
fn vec_and_string_churn() {
    let mut strings = Vec::new();
    for i in 0..2_000usize {
        strings.push(format!("object number {i} with some padding"));
        if strings.len() > 100 {
            strings.drain(..50);
        }
    }
    assert!(strings.iter().all(|s| s.contains("object number")));

    let v: Vec<u64> = (0..100_000).collect();
    assert_eq!(v.iter().sum::<u64>(), 100_000 * 99_999 / 2);
}

#[test]
fn boxes_freed_on_other_threads() {
    const PRODUCERS: usize = 4;
    const ITEMS: usize = 500;

    let (tx, rx) = mpsc::channel::<Vec<Box<[u8; 64]>>>();
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|_| {
            let tx = tx.clone();
            thread::spawn(move || {
                let items: Vec<Box<[u8; 64]>> = (0..ITEMS)
                    .map(|i| {
                        let mut arr = [0u8; 64];
                        arr[0] = (i & 0xff) as u8;
                        Box::new(arr)
                    })
                    .collect();
                tx.send(items).unwrap();
            })
        })
        .collect();
    drop(tx);

    let mut total = 0;
    for items in rx {
        total += items.len();
        drop(items);
    }
    for p in producers {
        p.join().unwrap();
    }
    assert_eq!(total, PRODUCERS * ITEMS);
}

#[test]
fn arc_shared_reads() {
    let data = Arc::new((0..4096u32).collect::<Vec<_>>());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let data = Arc::clone(&data);
            thread::spawn(move || {
                assert_eq!(data.len(), 4096);
                assert_eq!(data[1234], 1234);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn mixed_sizes_multithreaded() {
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let mut allocs: Vec<Vec<u8>> = Vec::new();
                for i in 0..400usize {
                    let size = match i % 5 {
                        0 => 8,
                        1 => 64,
                        2 => 512,
                        3 => 4096,
                        _ => 16384,
                    };
                    allocs.push(vec![i as u8; size]);
                    if allocs.len() > 50 {
                        let drained: Vec<_> = allocs.drain(..25).collect();
                        for (j, v) in drained.into_iter().enumerate() {
                            assert!(v.iter().all(|&b| b == v[0]), "corrupt vec {j}");
                        }
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}
