use std::collections::HashSet;
use std::sync::Arc;

use super::*;

fn request(confirmation: &str) -> CheckInRequest {
    CheckInRequest::new(confirmation, "Jane", "Doe")
}

fn scheduled(registry: &JobRegistry, confirmation: &str) -> JobRecord {
    registry.create(request(confirmation), Utc::now()).unwrap()
}

#[test]
fn test_create_starts_scheduled() {
    let registry = JobRegistry::new();
    let job = scheduled(&registry, "ABC123");

    assert!(!job.id.is_empty());
    assert_eq!(job.status, JobStatus::Scheduled);
    assert!(job.started_at.is_none());
    assert!(job.output.is_empty());
    assert_eq!(registry.get(&job.id).unwrap(), job);
}

#[test]
fn test_create_missing_first_name_inserts_nothing() {
    let registry = JobRegistry::new();
    let err = registry
        .create(CheckInRequest::new("ABC123", "", "Doe"), Utc::now())
        .unwrap_err();

    assert!(matches!(err, JobError::Validation(_)));
    assert!(registry.is_empty());
}

#[test]
fn test_create_rejects_duplicate_active() {
    let registry = JobRegistry::new();
    scheduled(&registry, "ABC123");

    let err = registry.create(request("abc123"), Utc::now()).unwrap_err();
    assert_eq!(err, JobError::DuplicateActive("ABC123".to_string()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_terminal_job_frees_confirmation() {
    let registry = JobRegistry::new();
    let first = scheduled(&registry, "ABC123");
    registry.transition(&first.id, Transition::Cancel).unwrap();

    let second = scheduled(&registry, "ABC123");
    assert_ne!(first.id, second.id);
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_terminal_owner_reclaimed_before_slot_release() {
    let registry = JobRegistry::new();
    let first = scheduled(&registry, "ABC123");

    // Job already finished but its `active` slot still points at it.
    registry.jobs.get_mut(&first.id).unwrap().status = JobStatus::Completed;
    assert_eq!(
        registry.active.get("ABC123").map(|owner| owner.clone()),
        Some(first.id.clone())
    );

    let second = scheduled(&registry, "ABC123");
    assert_eq!(
        registry.active.get("ABC123").map(|owner| owner.clone()),
        Some(second.id.clone())
    );

    // The stale owner's later release must not evict the new job.
    registry.active.remove_if("ABC123", |_, owner| owner == &first.id);
    let err = registry.create(request("ABC123"), Utc::now()).unwrap_err();
    assert_eq!(err, JobError::DuplicateActive("ABC123".to_string()));
}

#[test]
fn test_get_not_found() {
    let registry = JobRegistry::new();
    assert_eq!(
        registry.get("nope").unwrap_err(),
        JobError::NotFound("nope".to_string())
    );
}

#[test]
fn test_full_success_path_stamps_fields_once() {
    let registry = JobRegistry::new();
    let job = scheduled(&registry, "ABC123");

    let running = registry.transition(&job.id, Transition::Start).unwrap();
    assert_eq!(running.status, JobStatus::Running);
    let started_at = running.started_at.unwrap();

    let done = registry.transition(&job.id, Transition::Complete).unwrap();
    assert_eq!(done.status, JobStatus::Completed);
    assert_eq!(done.started_at, Some(started_at));
    assert!(done.completed_at.is_some());
    assert!(done.error.is_none());
    assert!(done.cancelled_at.is_none());
}

#[test]
fn test_fail_records_error() {
    let registry = JobRegistry::new();
    let job = scheduled(&registry, "ABC123");
    registry.transition(&job.id, Transition::Start).unwrap();

    let failed = registry
        .transition(
            &job.id,
            Transition::Fail {
                error: "site unreachable".to_string(),
            },
        )
        .unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("site unreachable"));
    assert!(failed.completed_at.is_none());
}

#[test]
fn test_cancel_running_rejected_and_unchanged() {
    let registry = JobRegistry::new();
    let job = scheduled(&registry, "ABC123");
    registry.transition(&job.id, Transition::Start).unwrap();

    let err = registry.transition(&job.id, Transition::Cancel).unwrap_err();
    assert_eq!(
        err,
        JobError::InvalidTransition {
            id: job.id.clone(),
            from: JobStatus::Running,
            to: JobStatus::Cancelled,
        }
    );
    let after = registry.get(&job.id).unwrap();
    assert_eq!(after.status, JobStatus::Running);
    assert!(after.cancelled_at.is_none());
}

#[test]
fn test_cancelled_cannot_start() {
    let registry = JobRegistry::new();
    let job = scheduled(&registry, "ABC123");
    let cancelled = registry.transition(&job.id, Transition::Cancel).unwrap();
    assert!(cancelled.cancelled_at.is_some());

    let err = registry.transition(&job.id, Transition::Start).unwrap_err();
    assert!(matches!(err, JobError::InvalidTransition { .. }));
    assert!(registry.get(&job.id).unwrap().started_at.is_none());
}

#[test]
fn test_transition_not_found() {
    let registry = JobRegistry::new();
    let err = registry.transition("ghost", Transition::Start).unwrap_err();
    assert!(matches!(err, JobError::NotFound(_)));
}

#[test]
fn test_append_output_only_while_running() {
    let registry = JobRegistry::new();
    let job = scheduled(&registry, "ABC123");

    assert!(!registry.append_output(&job.id, OutputLine::now("early")).unwrap());

    registry.transition(&job.id, Transition::Start).unwrap();
    assert!(registry.append_output(&job.id, OutputLine::now("Checked in")).unwrap());
    assert!(registry.append_output(&job.id, OutputLine::now("Boarding group A")).unwrap());

    registry.transition(&job.id, Transition::Complete).unwrap();
    assert!(!registry.append_output(&job.id, OutputLine::now("late")).unwrap());

    let messages: Vec<String> = registry
        .get(&job.id)
        .unwrap()
        .output
        .into_iter()
        .map(|line| line.message)
        .collect();
    assert_eq!(messages, vec!["Checked in", "Boarding group A"]);
}

#[test]
fn test_append_output_unknown_job() {
    let registry = JobRegistry::new();
    let err = registry.append_output("ghost", OutputLine::now("x")).unwrap_err();
    assert!(matches!(err, JobError::NotFound(_)));
}

#[test]
fn test_list_newest_first_and_counts() {
    let registry = JobRegistry::new();
    let a = scheduled(&registry, "AAA111");
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = scheduled(&registry, "BBB222");
    registry.transition(&a.id, Transition::Start).unwrap();

    let ids: Vec<String> = registry.list().into_iter().map(|job| job.id).collect();
    assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);
    assert_eq!(registry.count_by_status(JobStatus::Scheduled), 1);
    assert_eq!(registry.count_by_status(JobStatus::Running), 1);
}

#[test]
fn test_concurrent_creates_distinct_ids() {
    let registry = Arc::new(JobRegistry::new());
    let handles: Vec<_> = (0..100)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry
                    .create(request(&format!("CN{:04}", i)), Utc::now())
                    .unwrap()
                    .id
            })
        })
        .collect();

    let ids: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 100);
    assert_eq!(registry.len(), 100);
}

#[test]
fn test_concurrent_appends_keep_every_line() {
    let registry = Arc::new(JobRegistry::new());
    let job = scheduled(&registry, "ABC123");
    registry.transition(&job.id, Transition::Start).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = registry.clone();
            let id = job.id.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    registry
                        .append_output(&id, OutputLine::now(format!("{t}-{i}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let output = registry.get(&job.id).unwrap().output;
    assert_eq!(output.len(), 400);
    // Per-writer order is preserved.
    for t in 0..8 {
        let mine: Vec<&str> = output
            .iter()
            .map(|line| line.message.as_str())
            .filter(|m| m.starts_with(&format!("{t}-")))
            .collect();
        let expected: Vec<String> = (0..50).map(|i| format!("{t}-{i}")).collect();
        assert_eq!(mine, expected);
    }
}
