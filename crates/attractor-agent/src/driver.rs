//! The alternating two-participant conversation loop.

use crate::config::ConversationConfig;
use crate::llm::LlmClient;
use crate::participant::Participant;
use crate::stop::StopPhrases;
use attractor_core::{AttractorError, AttractorResult, Message, Speaker};
use attractor_session::{ConfigEcho, StopReason, Transcript, TurnRecord};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Callback invoked with every completed turn, e.g. for live console output.
pub type TurnHook = Box<dyn Fn(&TurnRecord) + Send + Sync>;

/// Where the conversation is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverState {
    /// Participant A speaks next.
    AwaitingA,
    /// Participant B speaks next.
    AwaitingB,
    /// Terminal.
    Stopped(StopReason),
}

impl DriverState {
    fn awaiting(speaker: Speaker) -> Self {
        match speaker {
            Speaker::A => DriverState::AwaitingA,
            Speaker::B => DriverState::AwaitingB,
        }
    }

    /// The participant whose turn it is, or `None` once stopped.
    pub fn next_speaker(&self) -> Option<Speaker> {
        match self {
            DriverState::AwaitingA => Some(Speaker::A),
            DriverState::AwaitingB => Some(Speaker::B),
            DriverState::Stopped(_) => None,
        }
    }
}

/// Runs an alternating two-party dialogue against one model client.
///
/// Exactly one request is in flight at a time. A failed request aborts the
/// run without recording a turn; the transcript collected so far stays
/// available through [`transcript`](Self::transcript) so the caller can flush
/// it. The driver never persists anything itself.
pub struct ConversationDriver {
    client: LlmClient,
    a: Participant,
    b: Participant,
    opening_message: String,
    max_turns: u32,
    stop_phrases: StopPhrases,
    turn_delay: Duration,
    transcript: Transcript,
    state: DriverState,
    on_turn: Option<TurnHook>,
}

impl ConversationDriver {
    /// Validates `config` and seeds both participants with the system prompt.
    pub fn initialize(client: LlmClient, config: ConversationConfig) -> AttractorResult<Self> {
        config.validate()?;

        let echo = ConfigEcho {
            model: client.model_id().to_string(),
            max_turns: config.max_turns,
            system_prompt: config.system_prompt.clone(),
            opening_message: config.opening_message.clone(),
            stop_phrases: config.stop_phrases.clone(),
            temperature: client.temperature(),
        };
        let (a, b) = Participant::pair(&config.system_prompt);

        Ok(Self {
            client,
            a,
            b,
            opening_message: config.opening_message,
            max_turns: config.max_turns,
            stop_phrases: StopPhrases::new(config.stop_phrases),
            turn_delay: Duration::from_millis(config.turn_delay_ms),
            transcript: Transcript::new(config.experiment, echo),
            state: DriverState::AwaitingA,
            on_turn: None,
        })
    }

    /// Registers a callback for every completed turn.
    pub fn on_turn(mut self, hook: TurnHook) -> Self {
        self.on_turn = Some(hook);
        self
    }

    /// Participants A and B, in that order.
    pub fn participants(&self) -> (&Participant, &Participant) {
        (&self.a, &self.b)
    }

    /// Current position in the turn cycle.
    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// The configured stop phrases.
    pub fn stop_phrases(&self) -> &StopPhrases {
        &self.stop_phrases
    }

    /// Turns completed so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consumes the driver, keeping the turns completed so far.
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Injects participant A's scripted opener as turn 0.
    ///
    /// No request is issued and the opener is not checked for stop phrases.
    /// Fails with [`AttractorError::Config`] once the conversation has started.
    pub fn open(&mut self) -> AttractorResult<()> {
        if !self.transcript.is_empty() {
            return Err(AttractorError::Config(
                "conversation has already been opened".to_string(),
            ));
        }

        self.transcript.metadata.started_at = Utc::now();
        info!(
            run_id = %self.transcript.metadata.run_id,
            model = %self.client.model_id(),
            max_turns = self.max_turns,
            "Starting conversation"
        );

        let opener = Message::assistant(self.opening_message.clone());
        self.b.push(opener.role_swapped());
        self.a.push(opener);

        let text = self.opening_message.clone();
        self.record(Speaker::A, &text);
        self.advance(Speaker::A, None);
        Ok(())
    }

    /// Requests one reply for `active`, cross-appends it and records the turn.
    ///
    /// The reply becomes an `assistant` message in the active history and a
    /// `user` message in the passive one, then the stop phrases and the turn
    /// budget decide the next state. `active` must be the participant the
    /// state is awaiting; otherwise, and before [`open`](Self::open), this is
    /// a [`AttractorError::Config`] and nothing is sent. A failed request
    /// leaves the driver exactly as it was.
    pub async fn step(&mut self, active: Speaker) -> AttractorResult<Message> {
        self.ensure_turn_of(active)?;

        let (speaker, listener) = match active {
            Speaker::A => (&mut self.a, &mut self.b),
            Speaker::B => (&mut self.b, &mut self.a),
        };

        debug!(speaker = %active, history = speaker.history().len(), "Requesting reply");
        let text = self.client.complete(speaker.history()).await?;
        if text.trim().is_empty() {
            warn!(speaker = %active, "Model returned an empty reply");
            return Err(AttractorError::EmptyReply { speaker: active });
        }

        let reply = Message::assistant(text);
        listener.push(reply.role_swapped());
        speaker.push(reply.clone());

        self.complete_turn(active, reply.content());
        Ok(reply)
    }

    /// Runs the conversation to a stop phrase or the turn budget.
    ///
    /// Opens the conversation if [`open`](Self::open) has not been called,
    /// then steps B, A, B, ... until the driver stops. A driver that has
    /// already stopped is rejected with [`AttractorError::Config`].
    pub async fn run(&mut self) -> AttractorResult<Transcript> {
        if matches!(self.state, DriverState::Stopped(_)) {
            return Err(AttractorError::Config(
                "conversation has already been run".to_string(),
            ));
        }
        if self.transcript.is_empty() {
            self.open()?;
        }

        while let Some(speaker) = self.state.next_speaker() {
            if self.transcript.len() > 1 && !self.turn_delay.is_zero() {
                tokio::time::sleep(self.turn_delay).await;
            }

            if let Err(e) = self.step(speaker).await {
                error!(
                    turn = self.transcript.next_index(),
                    speaker = %speaker,
                    error = %e,
                    "Conversation aborted"
                );
                return Err(e);
            }
        }

        Ok(self.transcript.clone())
    }

    fn ensure_turn_of(&self, active: Speaker) -> AttractorResult<()> {
        if self.transcript.is_empty() {
            return Err(AttractorError::Config(
                "conversation has not been opened".to_string(),
            ));
        }
        match &self.state {
            DriverState::Stopped(reason) => Err(AttractorError::Config(format!(
                "conversation has stopped ({reason:?})"
            ))),
            state if state.next_speaker() != Some(active) => Err(AttractorError::Config(
                format!("participant {active} spoke out of turn"),
            )),
            _ => Ok(()),
        }
    }

    fn complete_turn(&mut self, speaker: Speaker, text: &str) {
        self.record(speaker, text);
        let phrase = self.stop_phrases.matching(text).map(str::to_string);
        self.advance(speaker, phrase);
    }

    fn record(&mut self, speaker: Speaker, text: &str) {
        let record = self.transcript.record(speaker, text);
        info!(
            turn = record.turn_index,
            speaker = %speaker,
            chars = record.text.chars().count(),
            "Turn completed"
        );
        if let Some(hook) = &self.on_turn {
            hook(record);
        }
    }

    fn advance(&mut self, speaker: Speaker, stop_phrase: Option<String>) {
        let reason = match stop_phrase {
            Some(phrase) => Some(StopReason::StopPhrase { phrase }),
            None if self.transcript.len() >= self.max_turns as usize => Some(StopReason::MaxTurns),
            None => None,
        };

        self.state = match reason {
            Some(reason) => {
                info!(turns = self.transcript.len(), reason = ?reason, "Conversation stopped");
                self.transcript.mark_stopped(reason.clone());
                DriverState::Stopped(reason)
            }
            None => DriverState::awaiting(speaker.other()),
        };
    }
}
