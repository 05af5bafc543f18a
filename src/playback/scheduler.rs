// Melody scheduler - Converts note events into timed synth triggers
// Toggle semantics: play while running stops; never two sessions at once

use crate::error::SynthError;
use crate::playback::note::{NoteEvent, sequence_end};
use crate::playback::synth::{SynthBackend, SynthVoice};
use crate::timebase::{NtuRate, Seconds, midi_to_frequency};
use std::fmt;

/// Slack between the last note's end and the completion timer
pub const COMPLETION_SLACK: Seconds = Seconds(0.1);

/// Identifies one playback session; stale ids are ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// A trigger handed to the voice, in audio-clock seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTrigger {
    pub midi: u8,
    pub frequency_hz: f64,
    pub at: Seconds,
    pub duration: Seconds,
}

/// What a call to [`MelodyScheduler::play`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayOutcome {
    /// A new session is running
    Started { session: SessionId, ends_at: Seconds },
    /// A session was running and has been stopped
    Stopped,
    /// Nothing to play; the scheduler stays idle
    Empty,
}

struct PlaybackSession<V: SynthVoice> {
    id: SessionId,
    voice: V,
    triggers: Vec<ScheduledTrigger>,
    started_at: Seconds,
    ends_at: Seconds,
    completion_at: Seconds,
}

/// Schedules note sequences on a synth and tears them down deterministically
///
/// The session exclusively owns its voice. Stopping (explicitly, by toggling,
/// on completion or on drop) disposes the voice, which cancels every trigger
/// that has not sounded yet.
pub struct MelodyScheduler<S: SynthBackend> {
    synth: S,
    session: Option<PlaybackSession<S::Voice>>,
    next_session: u64,
    slack: Seconds,
}

impl<S: SynthBackend> MelodyScheduler<S> {
    pub fn new(synth: S) -> Self {
        Self::with_slack(synth, COMPLETION_SLACK)
    }

    pub fn with_slack(synth: S, slack: Seconds) -> Self {
        Self {
            synth,
            session: None,
            next_session: 1,
            slack,
        }
    }

    /// Plays `notes`, or stops the running session
    ///
    /// Each note is triggered at `now + time·rate` for `duration·rate`
    /// seconds. Invalid notes are skipped. An empty sequence leaves the
    /// scheduler idle without touching the synth.
    pub fn play(&mut self, notes: &[NoteEvent], rate: NtuRate) -> Result<PlayOutcome, SynthError> {
        if self.session.is_some() {
            self.stop();
            return Ok(PlayOutcome::Stopped);
        }

        let playable: Vec<&NoteEvent> = notes.iter().filter(|n| n.is_valid()).collect();
        if playable.len() != notes.len() {
            log::warn!(
                "Skipping {} invalid notes out of {}",
                notes.len() - playable.len(),
                notes.len()
            );
        }
        if playable.is_empty() {
            return Ok(PlayOutcome::Empty);
        }

        self.synth.start()?;
        let now = self.synth.now();
        let mut voice = self.synth.create_voice()?;

        let triggers: Vec<ScheduledTrigger> = playable
            .iter()
            .map(|note| ScheduledTrigger {
                midi: note.midi,
                frequency_hz: midi_to_frequency(note.midi),
                at: now + note.start_seconds(rate),
                duration: note.duration_seconds(rate),
            })
            .collect();

        for trigger in &triggers {
            voice.trigger_attack_release(trigger.frequency_hz, trigger.duration, trigger.at);
        }

        let ends_at = now + sequence_end(notes).to_seconds(rate);
        let id = SessionId(self.next_session);
        self.next_session += 1;

        log::info!(
            "{} started: {} notes, ends at {} ({})",
            id,
            triggers.len(),
            ends_at,
            rate
        );

        self.session = Some(PlaybackSession {
            id,
            voice,
            triggers,
            started_at: now,
            ends_at,
            completion_at: ends_at + self.slack,
        });

        Ok(PlayOutcome::Started {
            session: id,
            ends_at,
        })
    }

    /// Cancels pending triggers and releases the voice; no-op when idle
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.voice.dispose();
            log::info!("{} stopped", session.id);
        }
    }

    /// Host-loop hook: completes the session once the audio clock passes
    /// its completion instant. Returns the completed session.
    pub fn poll(&mut self) -> Option<SessionId> {
        let session = self.session.as_ref()?;
        if self.synth.now() < session.completion_at {
            return None;
        }
        let id = session.id;
        self.complete(id).then_some(id)
    }

    /// Completion callback for `session`; stale sessions are ignored
    pub fn complete(&mut self, session: SessionId) -> bool {
        if self.current_session() != Some(session) {
            log::debug!("Ignoring completion of stale {}", session);
            return false;
        }
        if let Some(mut finished) = self.session.take() {
            finished.voice.dispose();
        }
        log::info!("{} completed", session);
        true
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Triggers handed to the current voice (empty when idle)
    pub fn scheduled_triggers(&self) -> &[ScheduledTrigger] {
        self.session
            .as_ref()
            .map(|s| s.triggers.as_slice())
            .unwrap_or(&[])
    }

    /// Triggers of the current session that have not started yet
    pub fn pending_triggers(&self) -> usize {
        let now = self.synth.now();
        self.scheduled_triggers()
            .iter()
            .filter(|t| t.at > now)
            .count()
    }

    /// Audio-clock instant the session started at
    pub fn session_start(&self) -> Option<Seconds> {
        self.session.as_ref().map(|s| s.started_at)
    }

    /// Time since the session started, on the synth's clock
    pub fn elapsed(&self) -> Option<Seconds> {
        self.session_start()
            .map(|start| (self.synth.now() - start).max(Seconds::ZERO))
    }

    /// Audio-clock instant the last note ends
    pub fn session_end(&self) -> Option<Seconds> {
        self.session.as_ref().map(|s| s.ends_at)
    }

    /// Instant the completion timer fires
    pub fn completion_at(&self) -> Option<Seconds> {
        self.session.as_ref().map(|s| s.completion_at)
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn synth_mut(&mut self) -> &mut S {
        &mut self.synth
    }
}

impl<S: SynthBackend> Drop for MelodyScheduler<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
