//! Property-based tests for the checkpoint protocol and the lifecycle machine.
//!
//! These tests use proptest to check that every interruption point of a
//! create converges under restore, and that no event sequence drives the
//! lifecycle into an inconsistent state.

use dircheckpoint::checkpoint::{
    self, has_checkpoint, run_create_step, slot_path, CreateStep, Slot, Source,
};
use dircheckpoint::controller::{Event, Lifecycle, Phase, StepResult, SuspendToken};
use dircheckpoint::State;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

type Files = BTreeMap<String, Vec<u8>>;

fn arbitrary_files() -> impl Strategy<Value = Files> {
    prop::collection::btree_map(
        "(sub/|sub/deep/)?[a-c]{1,3}\\.txt",
        prop::collection::vec(any::<u8>(), 0..64),
        0..6,
    )
}

fn write_files(dir: &Path, files: &Files) {
    fs::create_dir_all(dir).unwrap();
    for (rel, bytes) in files {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }
}

fn read_files(dir: &Path) -> Files {
    walkdir::WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap();
            let rel = rel.to_string_lossy().replace('\\', "/");
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn replace_live(dir: &Path, files: &Files) {
    if dir.exists() {
        fs::remove_dir_all(dir).unwrap();
    }
    write_files(dir, files);
}

fn assert_only_current_slot(dir: &Path) -> Result<(), TestCaseError> {
    prop_assert!(!slot_path(dir, Slot::InProgress).exists());
    prop_assert!(!slot_path(dir, Slot::Old).exists());
    Ok(())
}

#[derive(Clone, Debug)]
enum Input {
    Start,
    Timer,
    ConfirmPending,
    ConfirmStranger,
    FinishCurrent,
    FinishStale,
    Committed,
}

fn arbitrary_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        Just(Input::Start),
        Just(Input::Timer),
        Just(Input::ConfirmPending),
        Just(Input::ConfirmStranger),
        Just(Input::FinishCurrent),
        Just(Input::FinishStale),
        Just(Input::Committed),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn interrupted_create_converges(
        prior in prop::option::of(arbitrary_files()),
        next in arbitrary_files(),
        scribble in arbitrary_files(),
        completed in 0usize..=4,
    ) {
        let tmp = TempDir::new().unwrap();
        let job = tmp.path().join("job");

        if let Some(prior) = &prior {
            replace_live(&job, prior);
            checkpoint::create(&job).unwrap();
        }
        replace_live(&job, &next);
        for step in &CreateStep::SEQUENCE[..completed] {
            run_create_step(&job, *step, Source::Live).unwrap();
        }
        replace_live(&job, &scribble);

        checkpoint::restore(&job).unwrap();

        // The old slot exists once DemoteCurrent ran over a prior snapshot,
        // which lets restore finish the promotion.
        let committed_new = completed >= 3 || (completed == 2 && prior.is_some());
        let expected = if committed_new {
            next.clone()
        } else {
            prior.clone().unwrap_or_default()
        };
        prop_assert_eq!(read_files(&job), expected);
        assert_only_current_slot(&job)?;
    }

    #[test]
    fn restore_is_idempotent(
        files in arbitrary_files(),
        scribble in arbitrary_files(),
        completed in 0usize..=4,
    ) {
        let tmp = TempDir::new().unwrap();
        let job = tmp.path().join("job");
        replace_live(&job, &files);
        checkpoint::create(&job).unwrap();
        for step in &CreateStep::SEQUENCE[..completed] {
            run_create_step(&job, *step, Source::Live).unwrap();
        }

        checkpoint::restore(&job).unwrap();
        let once = read_files(&job);
        replace_live(&job, &scribble);
        checkpoint::restore(&job).unwrap();

        prop_assert_eq!(read_files(&job), once);
        assert_only_current_slot(&job)?;
    }

    #[test]
    fn create_then_restore_round_trips(files in arbitrary_files(), scribble in arbitrary_files()) {
        let tmp = TempDir::new().unwrap();
        let job = tmp.path().join("job");
        replace_live(&job, &files);

        checkpoint::create(&job).unwrap();
        replace_live(&job, &scribble);
        checkpoint::restore(&job).unwrap();

        prop_assert_eq!(read_files(&job), files);
        prop_assert!(has_checkpoint(&job));
    }

    #[test]
    fn cleared_checkpoint_restores_empty(files in arbitrary_files()) {
        let tmp = TempDir::new().unwrap();
        let job = tmp.path().join("job");
        replace_live(&job, &files);
        checkpoint::create(&job).unwrap();

        checkpoint::clear(&job).unwrap();
        checkpoint::restore(&job).unwrap();

        prop_assert!(read_files(&job).is_empty());
        prop_assert!(!has_checkpoint(&job));
        assert_only_current_slot(&job)?;
    }

    #[test]
    fn lifecycle_stays_consistent(inputs in prop::collection::vec(arbitrary_input(), 0..40)) {
        let mut lifecycle = Lifecycle::new();
        let mut pending: Option<SuspendToken> = None;
        let mut commits = 0u64;
        let mut transitions = 0usize;
        let mut finished = false;

        for input in inputs {
            let cycle = lifecycle.cycle();
            let event = match input {
                Input::Start => Event::Start,
                Input::Timer => Event::TimerExpired { token: SuspendToken::new() },
                Input::ConfirmPending => Event::SuspendConfirmed {
                    token: pending.unwrap_or_default(),
                },
                Input::ConfirmStranger => Event::SuspendConfirmed { token: SuspendToken::new() },
                Input::FinishCurrent => Event::WorkFinished { cycle },
                Input::FinishStale => Event::WorkFinished { cycle: cycle.wrapping_sub(1) },
                Input::Committed => Event::CheckpointCommitted,
            };

            let before = lifecycle.current_phase();
            match lifecycle.handle(&event) {
                StepResult::Transitioned { to, pending: next, .. } => {
                    transitions += 1;
                    pending = next;
                    if before == Phase::Checkpointing && to == Phase::Running {
                        commits += 1;
                    }
                }
                StepResult::Ignored { .. } => {
                    prop_assert_eq!(lifecycle.current_phase(), before);
                    prop_assert_eq!(lifecycle.cycle(), cycle);
                }
            }

            prop_assert!(lifecycle.suppressed() <= 1);
            prop_assert!(lifecycle.cycle() >= cycle);
            if finished {
                prop_assert_eq!(lifecycle.current_phase(), Phase::Finished);
            }
            finished = lifecycle.current_phase().is_final();
        }

        prop_assert_eq!(lifecycle.cycle(), commits);
        prop_assert_eq!(lifecycle.history().transitions().len(), transitions);
    }
}
