//! Allocation strategy tests against the in-memory store.

use super::fixtures::{sample_draft, AlwaysTakenStore};
use chrono::NaiveDate;
use tala_core::domain::control_number::{Prefix, TypeCode};
use tala_core::foundation::IssuanceError;
use tala_core::infrastructure::storage::{AllocationStrategy, CertificateStore, MemoryStore, SequenceAllocator};

fn issue_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).expect("date")
}

fn coi_prefix() -> Prefix {
    Prefix::new(TypeCode::derive("Certificate of Indigency"), 2024, 3).expect("prefix")
}

#[test]
fn default_strategy_is_durable_counter() {
    assert_eq!(SequenceAllocator::default().strategy(), AllocationStrategy::DurableCounter);
}

#[test]
fn durable_counter_allocates_in_order() {
    let store = MemoryStore::new();
    let allocator = SequenceAllocator::durable_counter();
    let prefix = coi_prefix();

    for expected in ["COI-2024-03-0001", "COI-2024-03-0002", "COI-2024-03-0003"] {
        let record = allocator.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");
        assert_eq!(record.control_number.to_string(), expected);
    }
}

#[test]
fn optimistic_scan_allocates_in_order() {
    let store = MemoryStore::new();
    let allocator = SequenceAllocator::optimistic(5);
    let prefix = coi_prefix();

    let first = allocator.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");
    let second = allocator.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");
    assert_eq!(first.control_number.to_string(), "COI-2024-03-0001");
    assert_eq!(second.control_number.to_string(), "COI-2024-03-0002");
}

#[test]
fn optimistic_scan_exhausts_retry_budget() {
    let store = AlwaysTakenStore;
    let allocator = SequenceAllocator::optimistic(5);
    let prefix = coi_prefix();

    match allocator.issue(&store, &prefix, sample_draft(issue_date())) {
        Err(IssuanceError::AllocationExhausted { prefix: p, attempts }) => {
            assert_eq!(p, prefix.to_string());
            assert_eq!(attempts, 5);
        }
        other => panic!("expected AllocationExhausted, got {other:?}"),
    }
}

#[test]
fn optimistic_zero_budget_is_clamped_to_one_attempt() {
    let store = AlwaysTakenStore;
    let allocator = SequenceAllocator::optimistic(0);
    match allocator.issue(&store, &coi_prefix(), sample_draft(issue_date())) {
        Err(IssuanceError::AllocationExhausted { attempts, .. }) => assert_eq!(attempts, 1),
        other => panic!("expected AllocationExhausted, got {other:?}"),
    }
}

#[test]
fn strategies_share_one_store_without_colliding() {
    let store = MemoryStore::new();
    let prefix = coi_prefix();

    let optimistic = SequenceAllocator::optimistic(5);
    let counter = SequenceAllocator::durable_counter();

    let first = optimistic.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");
    let second = counter.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");
    let third = optimistic.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");

    assert_eq!(first.control_number.sequence(), 1);
    assert_eq!(second.control_number.sequence(), 2);
    assert_eq!(third.control_number.sequence(), 3);
}

#[test]
fn counter_matches_committed_records_exactly() {
    let store = MemoryStore::new();
    let prefix = coi_prefix();
    let allocator = SequenceAllocator::durable_counter();

    allocator.issue(&store, &prefix, sample_draft(issue_date())).expect("issue");
    assert_eq!(store.last_allocated_sequence(&prefix).expect("counter"), Some(1));
    assert_eq!(store.list_certificates_for_prefix(&prefix).expect("list").len(), 1);
}
