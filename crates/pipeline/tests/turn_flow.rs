//! End-to-end flow across the pipeline stages with a scripted
//! transcription session: ingress queue → bridge worker → debouncer →
//! committed turns.

use std::time::Duration;

use tokio::sync::mpsc;

use voicebridge_core::{CommittedTurn, TranscriptFragment, TurnSequence};
use voicebridge_pipeline::{
    ingress, BridgeEvent, FrameSource, TranscriberSession, TranscriptSink, TranscriptionBridge,
    TurnDebouncer,
};

const DEBOUNCE: Duration = Duration::from_millis(200);
const WAIT: Duration = Duration::from_secs(5);

/// Blocking session that emits a scripted fragment burst per consumed
/// frame, the way the provider fires several end-of-turn events around
/// one natural pause.
struct BurstSession {
    bursts: Vec<Vec<TranscriptFragment>>,
}

impl TranscriberSession for BurstSession {
    fn run(self: Box<Self>, mut frames: FrameSource, sink: TranscriptSink) {
        let mut bursts = self.bursts.into_iter();
        while frames.next_frame().is_some() {
            if let Some(burst) = bursts.next() {
                for fragment in burst {
                    sink.fragment(fragment);
                }
            }
        }
    }
}

async fn recv_commit(commits: &mut mpsc::UnboundedReceiver<CommittedTurn>) -> CommittedTurn {
    tokio::time::timeout(WAIT, commits.recv())
        .await
        .expect("timed out waiting for commit")
        .expect("commit channel closed")
}

#[tokio::test]
async fn test_fragment_burst_commits_one_turn() {
    let (audio_in, frames) = ingress::channel();
    let session = BurstSession {
        bursts: vec![vec![
            TranscriptFragment::partial("What is"),
            TranscriptFragment::final_result("What is"),
            TranscriptFragment::final_result("What is the time"),
        ]],
    };
    let mut bridge = TranscriptionBridge::spawn(Box::new(session), frames);

    let turns = TurnSequence::new();
    let (commit_tx, mut commits) = mpsc::unbounded_channel();
    let mut debouncer = TurnDebouncer::new(DEBOUNCE, turns.clone(), commit_tx);

    audio_in.push(vec![0u8; 320]);
    audio_in.close();

    // Drive fragments into the debouncer until the worker ends.
    while let Some(event) = bridge.next_event().await {
        match event {
            BridgeEvent::Fragment(fragment) => debouncer.on_fragment(&fragment),
            BridgeEvent::Error(err) => panic!("unexpected transcription error: {err}"),
            BridgeEvent::Ended => break,
        }
    }

    // Both end-of-turn fragments land inside one debounce window, so
    // exactly one turn commits, carrying the newest transcript.
    let turn = recv_commit(&mut commits).await;
    assert_eq!(turn.text, "What is the time");
    assert_eq!(turn.token, 1);
    assert!(turns.is_current(turn.token));

    tokio::time::sleep(DEBOUNCE * 2).await;
    assert!(commits.try_recv().is_err());
}

#[tokio::test]
async fn test_separate_utterances_commit_independent_turns() {
    let (audio_in, frames) = ingress::channel();
    let session = BurstSession {
        bursts: vec![
            vec![TranscriptFragment::final_result("first question")],
            vec![TranscriptFragment::final_result("second question")],
        ],
    };
    let mut bridge = TranscriptionBridge::spawn(Box::new(session), frames);

    let turns = TurnSequence::new();
    let (commit_tx, mut commits) = mpsc::unbounded_channel();
    let mut debouncer = TurnDebouncer::new(DEBOUNCE, turns.clone(), commit_tx);

    audio_in.push(vec![0u8; 320]);

    // First utterance arrives and must fully commit before the second
    // frame produces the next burst.
    match bridge.next_event().await {
        Some(BridgeEvent::Fragment(fragment)) => debouncer.on_fragment(&fragment),
        other => panic!("expected fragment, got {other:?}"),
    }
    let first = recv_commit(&mut commits).await;
    assert_eq!(first.text, "first question");

    audio_in.push(vec![0u8; 320]);
    audio_in.close();

    while let Some(event) = bridge.next_event().await {
        match event {
            BridgeEvent::Fragment(fragment) => debouncer.on_fragment(&fragment),
            BridgeEvent::Error(err) => panic!("unexpected transcription error: {err}"),
            BridgeEvent::Ended => break,
        }
    }

    let second = recv_commit(&mut commits).await;
    assert_eq!(second.text, "second question");
    assert!(second.token > first.token);
    assert!(turns.is_current(second.token));
    assert!(!turns.is_current(first.token));
}
