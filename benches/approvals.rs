//! Benchmarks for the approval path
//!
//! - approve: tally update for one member
//! - execute: threshold validation and detach on a fully approved proposal
//! - snapshot: CBOR round trip of an account with open proposals

use cohort::{Account, Address, Approvals, Clock, Member, Registry, Witness};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

struct Bench;
impl Witness for Bench {}

fn member(id: u32) -> Address {
    Address::from_identity(&format!("member-{}", id))
}

/// `size` members of weight 1, all holding "ops"; global threshold is the
/// full weight.
fn account(size: u32) -> Account {
    let members = (0..size)
        .map(|i| Member::new(member(i), 1, ["ops"]))
        .collect();
    let registry = Registry::new(
        members,
        u64::from(size),
        vec![cohort::Role::new("ops", u64::from(size))],
    )
    .unwrap();
    Account::new(Address::from_identity("bench"), "bench", registry)
}

fn propose(account: &mut Account, key: &str, actions: u64) {
    let auth = account.authenticate(&member(0), "").unwrap();
    let outcome: Approvals = account.empty_outcome(&member(0)).unwrap();
    let mut proposal = account
        .create_proposal(auth, outcome, Bench, key, "", 0, 1)
        .unwrap();
    for i in 0..actions {
        proposal.add_action(i, Bench).unwrap();
    }
    account.submit_proposal(proposal).unwrap();
}

fn bench_approve(c: &mut Criterion) {
    let mut group = c.benchmark_group("approve");

    for size in [10u32, 100, 1000] {
        let mut base = account(size);
        propose(&mut base, "p", 1);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || base.clone(),
                |mut account| {
                    account
                        .approve_proposal(black_box(&member(size - 1)), "p")
                        .unwrap();
                    account
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    for actions in [1u64, 10, 100] {
        let mut base = account(10);
        propose(&mut base, "p", actions);
        for i in 0..10 {
            base.approve_proposal(&member(i), "p").unwrap();
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(actions),
            &actions,
            |b, _| {
                b.iter_batched(
                    || base.clone(),
                    |mut account| {
                        let mut executable =
                            account.execute_proposal("p", &Clock::default()).unwrap();
                        while executable.remaining() > 0 {
                            let _: u64 = executable.next_action(Bench).unwrap();
                        }
                        executable.destroy().unwrap();
                        account
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut account = account(100);
    for i in 0..20 {
        propose(&mut account, &format!("p{}", i), 5);
    }

    c.bench_function("snapshot_round_trip", |b| {
        b.iter(|| {
            let bytes = black_box(&account).to_bytes().unwrap();
            Account::from_bytes(&bytes).unwrap()
        })
    });
}

criterion_group!(benches, bench_approve, bench_execute, bench_snapshot);
criterion_main!(benches);
